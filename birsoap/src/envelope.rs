//! Extraction du résultat d'une enveloppe de réponse SOAP
//!
//! Le service BIR répond par une enveloppe SOAP 1.2, parfois emballée dans un
//! message MTOM multipart. La seule partie utile est le texte de l'élément
//! `<xxxResult>` : un identifiant de session pour `Zaloguj`, une valeur
//! simple pour `GetValue`, un document XML échappé pour les opérations de
//! données.

use crate::error::SoapError;
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use tracing::trace;

/// Suffixe du nom local de l'élément porteur du résultat
pub const RESULT_SUFFIX: &[u8] = b"Result";

fn is_result(element: &BytesStart<'_>) -> bool {
    element.local_name().as_ref().ends_with(RESULT_SUFFIX)
}

/// Extrait le contenu brut de l'unique élément `...Result` de la réponse
///
/// Le préfixe de namespace et les attributs de l'élément sont ignorés. Le
/// contenu est renvoyé tel quel, sans décodage des entités : c'est
/// [`decode_to_mapping`](crate::decode_to_mapping) qui s'en charge. Un
/// élément vide ou auto-fermant donne une chaîne vide.
///
/// # Errors
///
/// * [`SoapError::ResultNotFound`] si aucun élément ne correspond
/// * [`SoapError::MultipleResults`] s'il y en a plusieurs
/// * [`SoapError::Envelope`] si le balisage est invalide
pub fn extract_result(response: &str) -> Result<String, SoapError> {
    let mut reader = Reader::from_str(response);
    // Les en-têtes MIME d'un message MTOM contiennent des `<...>` qui ne sont
    // pas des balises (Content-ID) : pas de contrôle d'appariement global.
    reader.config_mut().check_end_names = false;
    reader.config_mut().allow_unmatched_ends = true;
    let mut payload: Option<String> = None;
    let mut count = 0usize;

    loop {
        match reader.read_event()? {
            Event::Start(element) if is_result(&element) => {
                count += 1;
                let end = element.to_end().into_owned();
                let inner = reader.read_text(end.name())?;
                if payload.is_none() {
                    payload = Some(inner.into_owned());
                }
            }
            Event::Empty(element) if is_result(&element) => {
                count += 1;
                payload.get_or_insert_with(String::new);
            }
            Event::Eof => break,
            _ => {}
        }
    }

    match payload {
        None => Err(SoapError::ResultNotFound),
        Some(_) if count > 1 => Err(SoapError::MultipleResults(count)),
        Some(payload) => {
            trace!(bytes = payload.len(), "Extracted SOAP result");
            Ok(payload)
        }
    }
}
