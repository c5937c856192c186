//! Détection des erreurs signalées par le service dans les données
//!
//! Le service BIR ne signale pas ses erreurs par le statut HTTP ni par un
//! SOAP Fault : il renvoie un document `root/dane` ordinaire dont les champs
//! sont `ErrorCode`, `ErrorMessagePl` et `ErrorMessageEn`. La détection se
//! fait donc sur la forme des données, après normalisation des clés.

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

pub const ERROR_CODE_KEY: &str = "errorCode";
pub const ERROR_MESSAGE_PL_KEY: &str = "errorMessagePl";
pub const ERROR_MESSAGE_EN_KEY: &str = "errorMessageEn";

/// Champ présent dans toute réponse de données valide
const NAME_KEY: &str = "nazwa";

/// Erreur renvoyée par le service BIR
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[error("BIR service error (code {code}): {message}")]
pub struct ServiceError {
    /// Code d'erreur du service (ex: "4")
    pub code: String,
    /// Message en polonais, ou en anglais à défaut
    pub message: String,
    /// Message en anglais si fourni
    pub message_en: Option<String>,
}

/// Catégories des codes d'erreur documentés du service
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceErrorKind {
    /// 1 : vérification captcha requise
    CaptchaRequired,
    /// 2 : trop d'identifiants dans la recherche
    TooManyIdentifiers,
    /// 4 : aucune entité trouvée
    NotFound,
    /// 5 : rapport non autorisé pour cette clé
    ReportNotPermitted,
    /// 7 : session absente ou expirée
    SessionExpired,
    Other,
}

impl ServiceErrorKind {
    pub fn from_code(code: &str) -> Self {
        match code.trim() {
            "1" => Self::CaptchaRequired,
            "2" => Self::TooManyIdentifiers,
            "4" => Self::NotFound,
            "5" => Self::ReportNotPermitted,
            "7" => Self::SessionExpired,
            _ => Self::Other,
        }
    }
}

impl ServiceError {
    /// Construit l'erreur depuis une charge utile normalisée
    ///
    /// À n'appeler que si [`looks_like_error`] est vrai ; les champs absents
    /// donnent des chaînes vides.
    pub fn from_payload(payload: &Value) -> Self {
        let message_pl = field(payload, ERROR_MESSAGE_PL_KEY);
        let message_en = field(payload, ERROR_MESSAGE_EN_KEY);

        Self {
            code: field(payload, ERROR_CODE_KEY).unwrap_or_default(),
            message: message_pl.or_else(|| message_en.clone()).unwrap_or_default(),
            message_en,
        }
    }

    pub fn kind(&self) -> ServiceErrorKind {
        ServiceErrorKind::from_code(&self.code)
    }

    pub fn is_not_found(&self) -> bool {
        self.kind() == ServiceErrorKind::NotFound
    }

    /// Session absente ou expirée : un nouveau login est nécessaire
    pub fn is_session_error(&self) -> bool {
        self.kind() == ServiceErrorKind::SessionExpired
    }
}

/// Lit un champ feuille sous forme de chaîne, les nombres étant convertis
fn field(payload: &Value, key: &str) -> Option<String> {
    match payload.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Indique si les données normalisées ont la forme d'une erreur du service
///
/// Vrai pour un objet portant `errorCode`, au moins un message, et aucun
/// champ `nazwa`. Une liste de résultats n'est jamais une erreur.
pub fn looks_like_error(data: &Value) -> bool {
    let Value::Object(map) = data else {
        return false;
    };

    map.contains_key(ERROR_CODE_KEY)
        && (map.contains_key(ERROR_MESSAGE_PL_KEY) || map.contains_key(ERROR_MESSAGE_EN_KEY))
        && !map.contains_key(NAME_KEY)
}

/// Renvoie les données inchangées, ou l'erreur qu'elles décrivent
pub fn validate(data: Value) -> Result<Value, ServiceError> {
    if looks_like_error(&data) {
        Err(ServiceError::from_payload(&data))
    } else {
        Ok(data)
    }
}
