//! Gestion de la session BIR
//!
//! Le service attribue un identifiant de session au login ; il est ensuite
//! envoyé dans l'en-tête `sid` des opérations authentifiées. L'identifiant
//! est propre à chaque [`BirClient`], jamais global.

use crate::client::BirClient;
use crate::error::{BirError, Result};
use birsoap::{Action, extract_result};
use parking_lot::RwLock;
use tracing::{debug, info};

/// Identifiant de session courant, partagé derrière un verrou
#[derive(Debug, Default)]
pub(crate) struct Session {
    id: RwLock<Option<String>>,
}

impl Session {
    pub(crate) fn get(&self) -> Option<String> {
        self.id.read().clone()
    }

    pub(crate) fn set(&self, id: String) {
        *self.id.write() = Some(id);
    }

    /// Efface la session si elle vaut encore `id` (un login concurrent
    /// l'a peut-être remplacée)
    pub(crate) fn clear_if(&self, id: &str) {
        let mut current = self.id.write();
        if current.as_deref() == Some(id) {
            *current = None;
        }
    }
}

/// Premiers caractères de l'identifiant, pour les logs
fn redact(sid: &str) -> String {
    let prefix: String = sid.chars().take(4).collect();
    format!("{prefix}…")
}

impl BirClient {
    /// Ouvre une session avec la clé du client
    ///
    /// Remplace la session courante éventuelle et renvoie le nouvel
    /// identifiant.
    ///
    /// # Errors
    ///
    /// - [`BirError::Configuration`] si la clé est vide
    /// - [`BirError::Authentication`] si le service ne renvoie aucun
    ///   identifiant
    pub async fn login(&self) -> Result<String> {
        if self.api_key().trim().is_empty() {
            return Err(BirError::Configuration(
                "an API key is required to log in".to_string(),
            ));
        }

        let response = self
            .post(Action::Zaloguj, &[("key", self.api_key())], None)
            .await?;
        let sid = extract_result(&response)?.trim().to_string();

        if sid.is_empty() {
            return Err(BirError::Authentication(
                "the service returned an empty session id".to_string(),
            ));
        }

        info!(sid = %redact(&sid), production = self.is_production(), "BIR session opened");
        self.session.set(sid.clone());
        Ok(sid)
    }

    /// Ferme la session courante
    ///
    /// Renvoie la réponse du service, ou `false` sans requête s'il n'y a
    /// pas de session. La session locale n'est effacée qu'après un échange
    /// réussi : en cas d'échec, `logout` peut être rappelé.
    pub async fn logout(&self) -> Result<bool> {
        let Some(sid) = self.session.get() else {
            debug!("logout without session");
            return Ok(false);
        };

        let response = self.post(Action::Wyloguj, &[("sid", &sid)], None).await?;
        let closed = extract_result(&response)?.trim().eq_ignore_ascii_case("true");

        self.session.clear_if(&sid);
        info!(sid = %redact(&sid), closed, "BIR session closed");
        Ok(closed)
    }

    /// Identifiant de la session courante
    pub fn session_id(&self) -> Option<String> {
        self.session.get()
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.get().is_some()
    }
}
