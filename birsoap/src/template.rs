//! Construction des requêtes SOAP 1.2 du service BIR
//!
//! Chaque action connue du service a son gabarit : namespace du corps,
//! valeur de l'en-tête WS-Addressing `Action` et arguments. Les valeurs des
//! paramètres sont échappées par l'émetteur XML.

use crate::error::TemplateError;
use std::fmt;
use std::str::FromStr;
use xmltree::{Element, EmitterConfig, XMLNode};

pub const SOAP12_ENVELOPE_NS: &str = "http://www.w3.org/2003/05/soap-envelope";
pub const WS_ADDRESSING_NS: &str = "http://www.w3.org/2005/08/addressing";
/// Namespace des opérations publiques (session, données)
pub const BIR_PUBL_NS: &str = "http://CIS/BIR/PUBL/2014/07";
/// Namespace des opérations communes (`GetValue`)
pub const BIR_NS: &str = "http://CIS/BIR/2014/07";
pub const BIR_DATA_CONTRACT_NS: &str = "http://CIS/BIR/PUBL/2014/07/DataContract";

/// Rapport demandé par défaut à `DanePobierzPelnyRaport` (personne morale)
pub const DEFAULT_REPORT_NAME: &str = "PublDaneRaportPrawna";

/// Clés de recherche acceptées par `DaneSzukajPodmioty`, avec l'élément
/// correspondant du contrat de données
const SEARCH_KEYS: [(&str, &str); 3] = [("nip", "dat:Nip"), ("regon", "dat:Regon"), ("krs", "dat:Krs")];

/// Actions du service BIR
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    /// Ouverture de session (`key`)
    Zaloguj,
    /// Fermeture de session (`sid`)
    Wyloguj,
    /// Lecture d'un paramètre du service (`value`)
    GetValue,
    /// Rapport complet d'une entité (`regon`, `report` optionnel)
    DanePobierzPelnyRaport,
    /// Recherche d'entités (`nip`, `regon` ou `krs`)
    DaneSzukajPodmioty,
}

impl Action {
    pub const ALL: [Action; 5] = [
        Action::Zaloguj,
        Action::Wyloguj,
        Action::GetValue,
        Action::DanePobierzPelnyRaport,
        Action::DaneSzukajPodmioty,
    ];

    /// Nom de l'opération tel qu'attendu par le service
    pub fn name(self) -> &'static str {
        match self {
            Action::Zaloguj => "Zaloguj",
            Action::Wyloguj => "Wyloguj",
            Action::GetValue => "GetValue",
            Action::DanePobierzPelnyRaport => "DanePobierzPelnyRaport",
            Action::DaneSzukajPodmioty => "DaneSzukajPodmioty",
        }
    }

    fn namespace(self) -> &'static str {
        match self {
            Action::GetValue => BIR_NS,
            _ => BIR_PUBL_NS,
        }
    }

    /// Valeur de l'en-tête WS-Addressing `Action`
    pub fn soap_action(self) -> String {
        match self {
            Action::GetValue => format!("{}/IUslugaBIR/{}", BIR_NS, self.name()),
            _ => format!("{}/IUslugaBIRzewnPubl/{}", BIR_PUBL_NS, self.name()),
        }
    }

    fn arguments(self, params: &[(&str, &str)]) -> Result<Vec<Element>, TemplateError> {
        let required = |parameter: &'static str| {
            param(params, parameter).ok_or(TemplateError::MissingParameter {
                action: self.name(),
                parameter,
            })
        };

        let args = match self {
            Action::Zaloguj => vec![text_element("ns:pKluczUzytkownika", required("key")?)],
            Action::Wyloguj => vec![text_element("ns:pIdentyfikatorSesji", required("sid")?)],
            Action::GetValue => vec![text_element("ns:pNazwaParametru", required("value")?)],
            Action::DanePobierzPelnyRaport => vec![
                text_element("ns:pRegon", required("regon")?),
                text_element(
                    "ns:pNazwaRaportu",
                    param(params, "report").unwrap_or(DEFAULT_REPORT_NAME),
                ),
            ],
            Action::DaneSzukajPodmioty => {
                let (key, value) = SEARCH_KEYS
                    .iter()
                    .find_map(|(key, element)| param(params, key).map(|v| (*element, v)))
                    .ok_or(TemplateError::MissingParameter {
                        action: self.name(),
                        parameter: "nip|regon|krs",
                    })?;
                let mut criteria = Element::new("ns:pParametryWyszukiwania");
                criteria
                    .children
                    .push(XMLNode::Element(text_element(key, value)));
                vec![criteria]
            }
        };
        Ok(args)
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Action {
    type Err = TemplateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Action::ALL
            .into_iter()
            .find(|action| action.name() == s)
            .ok_or_else(|| TemplateError::UnknownAction(s.to_string()))
    }
}

fn param<'a>(params: &[(&str, &'a str)], name: &str) -> Option<&'a str> {
    params
        .iter()
        .find(|(key, _)| *key == name)
        .map(|(_, value)| *value)
}

fn text_element(name: &str, value: &str) -> Element {
    let mut element = Element::new(name);
    element.children.push(XMLNode::Text(value.to_string()));
    element
}

/// Gabarits de requêtes pour un point d'accès donné
///
/// Le point d'accès est repris dans l'en-tête WS-Addressing `To`, exigé par
/// le service.
#[derive(Debug, Clone)]
pub struct RequestTemplates {
    endpoint: String,
}

impl RequestTemplates {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Construit la requête de l'action nommée `action`
    ///
    /// # Errors
    ///
    /// * [`TemplateError::UnknownAction`] si l'action n'existe pas
    /// * [`TemplateError::MissingParameter`] si un paramètre requis manque
    pub fn render(&self, action: &str, params: &[(&str, &str)]) -> Result<String, TemplateError> {
        self.render_action(action.parse()?, params)
    }

    /// Construit la requête d'une action connue
    pub fn render_action(
        &self,
        action: Action,
        params: &[(&str, &str)],
    ) -> Result<String, TemplateError> {
        let mut operation = Element::new(&format!("ns:{}", action.name()));
        for arg in action.arguments(params)? {
            operation.children.push(XMLNode::Element(arg));
        }

        let mut header = Element::new("soap:Header");
        header
            .attributes
            .insert("xmlns:wsa".to_string(), WS_ADDRESSING_NS.to_string());
        header
            .children
            .push(XMLNode::Element(text_element("wsa:To", &self.endpoint)));
        header
            .children
            .push(XMLNode::Element(text_element("wsa:Action", &action.soap_action())));

        let mut body = Element::new("soap:Body");
        body.children.push(XMLNode::Element(operation));

        let mut envelope = Element::new("soap:Envelope");
        envelope
            .attributes
            .insert("xmlns:soap".to_string(), SOAP12_ENVELOPE_NS.to_string());
        envelope
            .attributes
            .insert("xmlns:ns".to_string(), action.namespace().to_string());
        if action == Action::DaneSzukajPodmioty {
            envelope
                .attributes
                .insert("xmlns:dat".to_string(), BIR_DATA_CONTRACT_NS.to_string());
        }
        envelope.children.push(XMLNode::Element(header));
        envelope.children.push(XMLNode::Element(body));

        let mut buf = Vec::new();
        let config = EmitterConfig::new()
            .write_document_declaration(true)
            .perform_indent(true)
            .indent_string("  ");
        envelope.write_with_config(&mut buf, config)?;

        Ok(String::from_utf8(buf)?)
    }
}
