//! Conversion du document XML de données en arbre générique
//!
//! Règles de conversion :
//! - le nom local d'un élément devient une clé
//! - des éléments frères de même nom deviennent une séquence
//! - un élément sans enfant devient une chaîne (texte rogné, `""` si vide)
//! - les attributs sont ignorés
//! - un texte mêlé à des éléments enfants est conservé sous `#text`
//!
//! Aucune conversion numérique n'est faite : un REGON comme `"012345678"`
//! doit garder ses zéros de tête.

use crate::error::SoapError;
use quick_xml::escape::unescape;
use serde_json::{Map, Value};
use xmltree::{Element, XMLNode};

/// Nom de l'élément racine des documents de données BIR
pub const DATA_ROOT: &str = "root";

/// Nom de l'élément portant les données sous la racine
pub const DATA_NODE: &str = "dane";

/// Clé utilisée pour le texte d'un élément qui a aussi des enfants
pub const TEXT_KEY: &str = "#text";

/// Décode les entités XML puis convertit le document en arbre
///
/// Le résultat a une seule clé, le nom de l'élément racine.
pub fn decode_to_mapping(xml: &str) -> Result<Value, SoapError> {
    let decoded = unescape(xml)?;
    let root = Element::parse(decoded.as_bytes())?;

    let mut mapping = Map::new();
    mapping.insert(root.name.clone(), element_to_value(&root));
    Ok(Value::Object(mapping))
}

/// Descend `root` → `dane` et renvoie les données
///
/// Les autres clés de `root` sont ignorées.
pub fn unwrap_data_root(mapping: &Value) -> Result<Value, SoapError> {
    let root = mapping
        .get(DATA_ROOT)
        .ok_or(SoapError::MissingNode(DATA_ROOT))?;
    let data = root.get(DATA_NODE).ok_or(SoapError::MissingNode(DATA_NODE))?;
    Ok(data.clone())
}

fn element_to_value(element: &Element) -> Value {
    let text = element_text(element);
    let mut children = element
        .children
        .iter()
        .filter_map(XMLNode::as_element)
        .peekable();

    if children.peek().is_none() {
        return Value::String(text);
    }

    let mut map = Map::new();
    for child in children {
        let value = element_to_value(child);
        match map.get_mut(&child.name) {
            // element_to_value ne renvoie jamais de tableau : un tableau
            // présent ici vient d'une répétition précédente
            Some(Value::Array(items)) => items.push(value),
            Some(existing) => {
                let first = existing.take();
                *existing = Value::Array(vec![first, value]);
            }
            None => {
                map.insert(child.name.clone(), value);
            }
        }
    }

    if !text.is_empty() {
        map.insert(TEXT_KEY.to_string(), Value::String(text));
    }
    Value::Object(map)
}

fn element_text(element: &Element) -> String {
    let mut text = String::new();
    for node in &element.children {
        match node {
            XMLNode::Text(t) | XMLNode::CData(t) => text.push_str(t),
            _ => {}
        }
    }
    text.trim().to_string()
}
