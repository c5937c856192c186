//! Opérations de consultation du registre
//!
//! Chaque opération suit le même chemin : requête, extraction du contenu
//! de l'élément `...Result`, décodage, descente `root` → `dane`,
//! normalisation des clés puis détection d'une erreur du service.

use crate::client::BirClient;
use crate::error::{BirError, Result};
use crate::fault;
use crate::normalize::{KeyTransform, camel_case, normalize, remove_prefix};
use birsoap::{Action, DEFAULT_REPORT_NAME, decode_to_mapping, extract_result, unwrap_data_root};
use serde_json::Value;
use std::fmt;
use tracing::{debug, warn};

/// Préfixe des champs du rapport complet des personnes morales
const REPORT_FIELD_PREFIX: &str = "praw";

/// Noms des paramètres acceptés par [`BirClient::value`]
pub mod params {
    /// 1 si la session est active, 0 sinon
    pub const SESSION_STATUS: &str = "StatusSesji";
    /// 0 indisponible, 1 disponible, 2 maintenance
    pub const SERVICE_STATUS: &str = "StatusUslugi";
    /// Code du dernier message du service
    pub const MESSAGE_CODE: &str = "KomunikatKod";
    /// Texte du dernier message du service
    pub const MESSAGE_TEXT: &str = "KomunikatTresc";
    /// Date de mise à jour des données
    pub const DATA_STATE: &str = "StanDanych";
}

/// Critère de recherche d'une entité
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchQuery {
    /// Numéro d'identification fiscale (10 chiffres)
    Nip(String),
    /// Numéro REGON (9 ou 14 chiffres)
    Regon(String),
    /// Numéro du registre judiciaire KRS
    Krs(String),
}

impl SearchQuery {
    pub fn nip(nip: impl Into<String>) -> Self {
        Self::Nip(nip.into())
    }

    pub fn regon(regon: impl Into<String>) -> Self {
        Self::Regon(regon.into())
    }

    pub fn krs(krs: impl Into<String>) -> Self {
        Self::Krs(krs.into())
    }

    /// Paramètre de gabarit correspondant (`nip`, `regon` ou `krs`)
    pub fn param(&self) -> (&'static str, &str) {
        match self {
            Self::Nip(v) => ("nip", v),
            Self::Regon(v) => ("regon", v),
            Self::Krs(v) => ("krs", v),
        }
    }
}

impl fmt::Display for SearchQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (name, value) = self.param();
        write!(f, "{name}={value}")
    }
}

impl BirClient {
    /// Lit un paramètre du service (voir [`params`])
    ///
    /// Renvoie le contenu brut de l'élément résultat, sans décodage. Cette
    /// opération n'envoie pas d'identifiant de session.
    ///
    /// # Exemple
    ///
    /// ```rust,no_run
    /// # use birclient::{BirClient, params};
    /// # async fn example(client: &BirClient) -> birclient::Result<()> {
    /// let status = client.value(params::SERVICE_STATUS).await?;
    /// println!("service status: {status}");
    /// # Ok(())
    /// # }
    /// ```
    pub async fn value(&self, name: &str) -> Result<String> {
        let response = self.post(Action::GetValue, &[("value", name)], None).await?;
        Ok(extract_result(&response)?)
    }

    /// Rapport complet d'une personne morale
    ///
    /// Les champs perdent leur préfixe `praw` et passent en camelCase
    /// (`prawNazwa` → `nazwa`).
    pub async fn report(&self, regon: &str) -> Result<Value> {
        let sid = self.session_id();
        let response = self
            .post(
                Action::DanePobierzPelnyRaport,
                &[("regon", regon), ("report", DEFAULT_REPORT_NAME)],
                sid.as_deref(),
            )
            .await?;

        let strip = remove_prefix(REPORT_FIELD_PREFIX);
        decode_response(&response, &[&strip, &camel_case])
    }

    /// Recherche d'entités par NIP, REGON ou KRS
    ///
    /// Un seul résultat donne un objet, plusieurs une liste d'objets.
    pub async fn search(&self, query: &SearchQuery) -> Result<Value> {
        let sid = self.session_id();
        let response = self
            .post(Action::DaneSzukajPodmioty, &[query.param()], sid.as_deref())
            .await?;

        decode_response(&response, &[&camel_case])
    }
}

fn decode_response(response: &str, transforms: &[KeyTransform<'_>]) -> Result<Value> {
    let payload = extract_result(response)?;
    let data = unwrap_data_root(&decode_to_mapping(&payload)?)?;
    let normalized = normalize(&data, transforms);
    debug!(
        records = normalized.as_array().map_or(1, Vec::len),
        "decoded BIR data"
    );
    fault::validate(normalized).map_err(|e| {
        warn!(code = %e.code, message = %e.message, "BIR service error");
        BirError::from(e)
    })
}
