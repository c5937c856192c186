//! # birclient - Client du registre REGON (service BIR de GUS)
//!
//! Ce crate fournit un client asynchrone pour le service SOAP BIR
//! (« Baza Internetowa REGON ») de l'office statistique polonais.
//!
//! ## Fonctionnalités
//!
//! - Ouverture et fermeture de session ([`BirClient::login`], [`BirClient::logout`])
//! - Lecture des paramètres du service ([`BirClient::value`])
//! - Rapport complet d'une personne morale ([`BirClient::report`])
//! - Recherche par NIP, REGON ou KRS ([`BirClient::search`])
//! - Détection des erreurs signalées dans les données ([`ServiceError`])
//! - Clés des données normalisées en camelCase
//!
//! Sans clé d'accès, le client utilise l'environnement de test du service
//! et sa clé publique.
//!
//! ## Exemple
//!
//! ```rust,no_run
//! use birclient::{BirClient, SearchQuery};
//!
//! #[tokio::main]
//! async fn main() -> birclient::Result<()> {
//!     let client = BirClient::from_config()?;
//!     client.login().await?;
//!
//!     match client.search(&SearchQuery::regon("000331501")).await {
//!         Ok(entity) => println!("{}", entity["nazwa"]),
//!         Err(e) if e.as_service_error().is_some_and(|s| s.is_not_found()) => {
//!             println!("not found")
//!         }
//!         Err(e) => return Err(e),
//!     }
//!
//!     client.logout().await?;
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod config_ext;
pub mod error;
pub mod fault;
pub mod normalize;
pub mod operations;
mod session;

pub use client::{
    BirClient, ClientBuilder, DEFAULT_REQUEST_TIMEOUT_SECS, PRODUCTION_ENDPOINT, TEST_API_KEY,
    TEST_ENDPOINT,
};
pub use config_ext::BirConfigExt;
pub use error::{BirError, Result};
pub use fault::{ServiceError, ServiceErrorKind};
pub use operations::{SearchQuery, params};

pub use serde_json::Value;
