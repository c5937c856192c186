//! Client principal pour interagir avec le service BIR
//!
//! Ce module porte la configuration figée du client (clé, point d'accès,
//! délai) et le transport HTTP commun à toutes les opérations. Les
//! opérations elles-mêmes sont dans [`session`](crate::session) et
//! [`operations`](crate::operations).

use crate::config_ext::BirConfigExt;
use crate::error::{BirError, Result};
use crate::session::Session;
use birconfig::Config;
use birsoap::{Action, RequestTemplates, SOAP_CONTENT_TYPE};
use reqwest::Client;
use reqwest::header::CONTENT_TYPE;
use std::time::Duration;
use tracing::{debug, info, warn};

/// URL du service de production
pub const PRODUCTION_ENDPOINT: &str =
    "https://wyszukiwarkaregon.stat.gov.pl/wsBIR/UslugaBIRzewnPubl.svc";

/// URL du service de test
pub const TEST_ENDPOINT: &str =
    "https://wyszukiwarkaregontest.stat.gov.pl/wsBIR/UslugaBIRzewnPubl.svc";

/// Clé publique de l'environnement de test
pub const TEST_API_KEY: &str = "abcde12345abcde12345";

/// Délai par défaut d'un échange HTTP (30 secondes)
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// En-tête portant l'identifiant de session
pub const SESSION_HEADER: &str = "sid";

/// Client du service BIR
///
/// La configuration (clé, point d'accès, délai) est figée à la construction.
/// Le seul état mutable est l'identifiant de session, protégé par un verrou :
/// toutes les opérations prennent `&self` et le client peut être partagé
/// entre tâches via un `Arc`.
///
/// # Exemple
///
/// ```rust,no_run
/// use birclient::{BirClient, SearchQuery};
///
/// #[tokio::main]
/// async fn main() -> birclient::Result<()> {
///     // Sans clé : environnement de test et clé publique
///     let client = BirClient::new(None)?;
///     client.login().await?;
///
///     let found = client.search(&SearchQuery::nip("5261040828")).await?;
///     println!("{}", found["nazwa"]);
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct BirClient {
    http: Client,
    api_key: String,
    production: bool,
    templates: RequestTemplates,
    timeout: Duration,
    pub(crate) session: Session,
}

impl BirClient {
    /// Crée un client avec les réglages par défaut
    ///
    /// Une clé non vide sélectionne la production, sinon le client utilise
    /// l'environnement de test et sa clé publique.
    pub fn new(api_key: Option<&str>) -> Result<Self> {
        let mut builder = Self::builder();
        if let Some(key) = api_key {
            builder = builder.api_key(key);
        }
        builder.build()
    }

    /// Crée un builder pour configurer le client
    pub fn builder() -> ClientBuilder {
        ClientBuilder::default()
    }

    /// Crée un client depuis la configuration globale
    ///
    /// # Exemple
    ///
    /// ```rust,no_run
    /// use birclient::BirClient;
    ///
    /// # fn main() -> birclient::Result<()> {
    /// let client = BirClient::from_config()?;
    /// println!("endpoint: {}", client.endpoint());
    /// # Ok(())
    /// # }
    /// ```
    pub fn from_config() -> Result<Self> {
        let config = birconfig::get_config()?;
        Self::from_config_obj(config.as_ref())
    }

    /// Crée un client depuis un objet Config spécifique
    pub fn from_config_obj(config: &Config) -> Result<Self> {
        let mut builder = Self::builder().timeout(config.get_bir_timeout()?);
        if let Some(key) = config.get_bir_api_key()? {
            builder = builder.api_key(key);
        }
        if let Some(endpoint) = config.get_bir_endpoint()? {
            builder = builder.endpoint(endpoint);
        }
        builder.build()
    }

    /// Vrai si une clé de production a été fournie
    pub fn is_production(&self) -> bool {
        self.production
    }

    /// URL du service utilisée par ce client
    pub fn endpoint(&self) -> &str {
        self.templates.endpoint()
    }

    /// Clé d'accès utilisée pour le login
    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    /// Délai appliqué à chaque échange HTTP
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Envoie une requête et renvoie le corps brut de la réponse
    ///
    /// `sid` est envoyé dans l'en-tête `sid` lorsqu'il est présent.
    pub(crate) async fn post(
        &self,
        action: Action,
        params: &[(&str, &str)],
        sid: Option<&str>,
    ) -> Result<String> {
        let body = self.templates.render_action(action, params)?;

        debug!(
            action = %action,
            endpoint = %self.endpoint(),
            authenticated = sid.is_some(),
            "POST BIR request"
        );

        let mut request = self
            .http
            .post(self.endpoint())
            .timeout(self.timeout)
            .header(CONTENT_TYPE, SOAP_CONTENT_TYPE)
            .body(body);

        if let Some(sid) = sid {
            request = request.header(SESSION_HEADER, sid);
        }

        let response = request.send().await.map_err(|e| self.transport_error(e))?;
        let status = response.status();
        debug!(action = %action, status = %status, "BIR response");

        if !status.is_success() {
            let body = match response.text().await {
                Ok(body) => body,
                Err(e) => {
                    warn!(action = %action, error = %e, "Failed to read error response body");
                    format!("<unreadable body: {e}>")
                }
            };
            warn!(action = %action, status = status.as_u16(), "BIR request failed");
            return Err(BirError::Status {
                code: status.as_u16(),
                body,
            });
        }

        response.text().await.map_err(|e| self.transport_error(e))
    }

    fn transport_error(&self, error: reqwest::Error) -> BirError {
        if error.is_timeout() {
            warn!(timeout = ?self.timeout, "BIR request timed out");
            BirError::Timeout(self.timeout)
        } else {
            warn!(error = %error, "BIR transport error");
            BirError::Http(error)
        }
    }
}

/// Builder pour configurer un [`BirClient`]
#[derive(Debug)]
pub struct ClientBuilder {
    client: Option<Client>,
    api_key: Option<String>,
    test_key: String,
    endpoint: Option<String>,
    timeout: Duration,
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self {
            client: None,
            api_key: None,
            test_key: TEST_API_KEY.to_string(),
            endpoint: None,
            timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
        }
    }
}

impl ClientBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clé de production ; une chaîne vide équivaut à aucune clé
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        let key = key.into();
        self.api_key = if key.trim().is_empty() { None } else { Some(key) };
        self
    }

    /// Remplace la clé publique utilisée sans clé de production
    pub fn test_key(mut self, key: impl Into<String>) -> Self {
        self.test_key = key.into();
        self
    }

    /// Remplace l'URL du service choisie d'après la clé (recette, mock)
    pub fn endpoint(mut self, url: impl Into<String>) -> Self {
        self.endpoint = Some(url.into());
        self
    }

    /// Délai de chaque échange HTTP
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Client HTTP à utiliser (pool de connexions partagé, proxy...)
    pub fn client(mut self, client: Client) -> Self {
        self.client = Some(client);
        self
    }

    /// Construit le client
    pub fn build(self) -> Result<BirClient> {
        let http = match self.client {
            Some(client) => client,
            None => Client::builder().build()?,
        };

        let production = self.api_key.is_some();
        let endpoint = self.endpoint.unwrap_or_else(|| {
            if production {
                PRODUCTION_ENDPOINT.to_string()
            } else {
                TEST_ENDPOINT.to_string()
            }
        });
        let api_key = self.api_key.unwrap_or(self.test_key);

        info!(
            endpoint = %endpoint,
            production,
            timeout = ?self.timeout,
            "Creating BIR client"
        );

        Ok(BirClient {
            http,
            api_key,
            production,
            templates: RequestTemplates::new(endpoint),
            timeout: self.timeout,
            session: Session::default(),
        })
    }
}
