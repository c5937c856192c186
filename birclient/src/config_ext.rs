//! Extension pour intégrer le client BIR dans birconfig
//!
//! Ce module fournit le trait `BirConfigExt` qui ajoute à `birconfig::Config`
//! la lecture et l'écriture des réglages du client (section `bir`).
//!
//! # Exemple
//!
//! ```no_run
//! use birconfig::get_config;
//! use birclient::BirConfigExt;
//!
//! # fn main() -> anyhow::Result<()> {
//! let config = get_config()?;
//! config.set_bir_api_key(Some("0123456789abcdef0123"))?;
//! println!("timeout: {:?}", config.get_bir_timeout()?);
//! # Ok(())
//! # }
//! ```

use crate::client::DEFAULT_REQUEST_TIMEOUT_SECS;
use anyhow::Result;
use birconfig::Config;
use serde_yaml::Value;
use std::time::Duration;

/// Trait d'extension pour gérer la configuration du client BIR
///
/// Une clé ou un point d'accès vide dans le fichier est traité comme absent.
pub trait BirConfigExt {
    /// Clé de production, `None` pour l'environnement de test
    fn get_bir_api_key(&self) -> Result<Option<String>>;

    /// Enregistre la clé de production (`None` l'efface)
    fn set_bir_api_key(&self, key: Option<&str>) -> Result<()>;

    /// Délai de chaque requête (défaut : 30 secondes)
    ///
    /// Une valeur absente ou invalide est remplacée par le défaut, qui est
    /// alors persisté.
    fn get_bir_timeout(&self) -> Result<Duration>;

    fn set_bir_timeout_secs(&self, secs: u64) -> Result<()>;

    /// URL du service imposée, `None` pour la déduire de la clé
    fn get_bir_endpoint(&self) -> Result<Option<String>>;

    fn set_bir_endpoint(&self, endpoint: Option<&str>) -> Result<()>;
}

impl BirConfigExt for Config {
    fn get_bir_api_key(&self) -> Result<Option<String>> {
        self.get_optional_string(&["bir", "api_key"])
    }

    fn set_bir_api_key(&self, key: Option<&str>) -> Result<()> {
        self.set_value(
            &["bir", "api_key"],
            Value::String(key.unwrap_or_default().to_string()),
        )
    }

    fn get_bir_timeout(&self) -> Result<Duration> {
        let secs = match self.get_value(&["bir", "timeout_secs"]) {
            Ok(Value::Number(n)) => n.as_u64().filter(|&s| s > 0),
            _ => None,
        };

        match secs {
            Some(secs) => Ok(Duration::from_secs(secs)),
            None => {
                // Valeur absente ou invalide : on persiste le défaut
                self.set_bir_timeout_secs(DEFAULT_REQUEST_TIMEOUT_SECS)?;
                Ok(Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS))
            }
        }
    }

    fn set_bir_timeout_secs(&self, secs: u64) -> Result<()> {
        self.set_value(
            &["bir", "timeout_secs"],
            Value::Number(serde_yaml::Number::from(secs)),
        )
    }

    fn get_bir_endpoint(&self) -> Result<Option<String>> {
        self.get_optional_string(&["bir", "endpoint"])
    }

    fn set_bir_endpoint(&self, endpoint: Option<&str>) -> Result<()> {
        self.set_value(
            &["bir", "endpoint"],
            Value::String(endpoint.unwrap_or_default().to_string()),
        )
    }
}
