//! # birsoap - Codec SOAP du service BIR
//!
//! Ce crate regroupe la partie sans I/O du client BIR (registre REGON de
//! GUS) :
//!
//! - [`RequestTemplates`] : construction des enveloppes de requête SOAP 1.2
//!   pour chaque [`Action`]
//! - [`extract_result`] : extraction du contenu de l'unique élément
//!   `...Result` d'une réponse
//! - [`decode_to_mapping`] : décodage du document de données en arbre
//!   [`serde_json::Value`]
//! - [`unwrap_data_root`] : descente `root` → `dane`
//!
//! ## Exemple
//!
//! ```
//! use birsoap::{decode_to_mapping, extract_result, unwrap_data_root};
//!
//! let response = "<s:Envelope><s:Body><DaneSzukajPodmiotyResponse>\
//!     <DaneSzukajPodmiotyResult>&lt;root&gt;&lt;dane&gt;&lt;Regon&gt;123456789&lt;/Regon&gt;\
//!     &lt;/dane&gt;&lt;/root&gt;</DaneSzukajPodmiotyResult>\
//!     </DaneSzukajPodmiotyResponse></s:Body></s:Envelope>";
//!
//! let payload = extract_result(response)?;
//! let data = unwrap_data_root(&decode_to_mapping(&payload)?)?;
//! assert_eq!(data["Regon"], "123456789");
//! # Ok::<(), birsoap::SoapError>(())
//! ```

mod decode;
mod envelope;
mod error;
mod template;

pub use decode::{DATA_NODE, DATA_ROOT, TEXT_KEY, decode_to_mapping, unwrap_data_root};
pub use envelope::extract_result;
pub use error::{SoapError, TemplateError};
pub use template::{
    Action, BIR_DATA_CONTRACT_NS, BIR_NS, BIR_PUBL_NS, DEFAULT_REPORT_NAME, RequestTemplates,
    SOAP12_ENVELOPE_NS, WS_ADDRESSING_NS,
};

/// Content-Type des requêtes SOAP 1.2
pub const SOAP_CONTENT_TYPE: &str = "application/soap+xml";
