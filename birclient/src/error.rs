//! Gestion des erreurs pour le client BIR

use crate::fault::ServiceError;
use birsoap::{SoapError, TemplateError};
use std::time::Duration;
use thiserror::Error;

/// Type Result personnalisé pour birclient
pub type Result<T> = std::result::Result<T, BirError>;

/// Erreurs possibles lors de l'utilisation du client BIR
///
/// Aucune erreur n'est rattrapée ni rejouée par le client : chacune remonte
/// à l'appelant de l'opération qui l'a produite.
#[derive(Error, Debug)]
pub enum BirError {
    /// Paramètre requis absent (clé d'accès vide, etc.)
    #[error("BIR configuration error: {0}")]
    Configuration(String),

    /// Erreur de lecture de la configuration (birconfig)
    #[error("Configuration error: {0}")]
    Config(#[from] anyhow::Error),

    /// Réponse hors du contrat d'enveloppe SOAP
    #[error("Protocol error: {0}")]
    Protocol(#[from] SoapError),

    /// Requête impossible à construire
    #[error("Request template error: {0}")]
    Template(#[from] TemplateError),

    /// Le login a abouti côté transport mais sans identifiant de session
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Erreur signalée par le service dans les données
    #[error(transparent)]
    Service(#[from] ServiceError),

    /// Erreur HTTP (réseau, TLS, lecture du corps)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Statut HTTP hors 2xx
    #[error("HTTP status {code}: {body}")]
    Status { code: u16, body: String },

    /// Délai de l'appel dépassé
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),
}

impl BirError {
    /// Vérifie si l'erreur indique une session absente ou expirée
    ///
    /// Dans ce cas un nouvel appel à `login()` peut suffire.
    pub fn is_session_error(&self) -> bool {
        matches!(self, BirError::Service(e) if e.is_session_error())
    }

    /// Vérifie si l'erreur vient du transport (réseau, statut, délai)
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            BirError::Http(_) | BirError::Status { .. } | BirError::Timeout(_)
        )
    }

    /// Retourne l'erreur de service portée, le cas échéant
    pub fn as_service_error(&self) -> Option<&ServiceError> {
        match self {
            BirError::Service(e) => Some(e),
            _ => None,
        }
    }
}
