//! Erreurs du codec SOAP

use thiserror::Error;

/// Réponse hors du contrat d'enveloppe attendu
///
/// Toutes les variantes sont fatales pour l'appel en cours : le service a
/// renvoyé quelque chose que le client ne sait pas interpréter.
#[derive(Debug, Error)]
pub enum SoapError {
    #[error("SOAP Result not found in response")]
    ResultNotFound,

    #[error("SOAP response contains {0} Result elements, expected exactly one")]
    MultipleResults(usize),

    #[error("Malformed SOAP response: {0}")]
    Envelope(#[from] quick_xml::Error),

    #[error("Invalid XML entity in payload: {0}")]
    Entity(#[from] quick_xml::escape::EscapeError),

    #[error("Payload XML parse error: {0}")]
    Payload(#[from] xmltree::ParseError),

    #[error("Missing '{0}' node in payload")]
    MissingNode(&'static str),
}

/// Erreur de construction d'une requête
#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("Unknown BIR action: {0}")]
    UnknownAction(String),

    #[error("Action {action} requires parameter '{parameter}'")]
    MissingParameter {
        action: &'static str,
        parameter: &'static str,
    },

    #[error("Failed to write request XML: {0}")]
    Emit(#[from] xmltree::Error),

    #[error("Request XML is not valid UTF-8")]
    Encoding(#[from] std::string::FromUtf8Error),
}
