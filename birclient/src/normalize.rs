//! Normalisation des clés des données renvoyées par le service
//!
//! Les schémas de réponse du service n'ont pas les mêmes conventions de
//! nommage : le rapport complet préfixe ses champs (`praw_nazwa`), la
//! recherche utilise le PascalCase (`Nazwa`). Les deux sont ramenés au
//! camelCase par une suite ordonnée de transformations de clés.

use serde_json::{Map, Value};

/// Transformation appliquée à chaque clé
pub type KeyTransform<'a> = &'a dyn Fn(&str) -> String;

/// Applique les transformations, dans l'ordre, à toutes les clés de tous
/// les niveaux (y compris dans les séquences)
///
/// L'entrée n'est pas modifiée. Si deux clés d'un même objet deviennent
/// identiques, la dernière l'emporte.
pub fn normalize(value: &Value, transforms: &[KeyTransform<'_>]) -> Value {
    match value {
        Value::Object(map) => {
            let mut out = Map::with_capacity(map.len());
            for (key, child) in map {
                let key = transforms
                    .iter()
                    .fold(key.clone(), |key, transform| transform(&key));
                out.insert(key, normalize(child, transforms));
            }
            Value::Object(out)
        }
        Value::Array(items) => Value::Array(
            items
                .iter()
                .map(|item| normalize(item, transforms))
                .collect(),
        ),
        other => other.clone(),
    }
}

/// Retire `prefix` en tête de clé, si la clé ne se réduit pas au préfixe
pub fn remove_prefix(prefix: impl Into<String>) -> impl Fn(&str) -> String {
    let prefix = prefix.into();
    move |key: &str| match key.strip_prefix(prefix.as_str()) {
        Some(rest) if !rest.is_empty() => rest.to_string(),
        _ => key.to_string(),
    }
}

/// Convertit une clé en camelCase
///
/// Les mots sont séparés par `_`, `-`, `.`, les blancs et les changements
/// de casse (`SilosID` donne `silos` + `ID`). Le premier mot est mis en
/// minuscules, les suivants capitalisés.
pub fn camel_case(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    for (index, word) in split_words(key).iter().enumerate() {
        let lower = word.to_lowercase();
        if index == 0 {
            out.push_str(&lower);
            continue;
        }
        let mut chars = lower.chars();
        if let Some(first) = chars.next() {
            out.extend(first.to_uppercase());
            out.push_str(chars.as_str());
        }
    }
    out
}

fn is_separator(c: char) -> bool {
    matches!(c, '_' | '-' | '.') || c.is_whitespace()
}

fn split_words(key: &str) -> Vec<String> {
    let chars: Vec<char> = key.chars().collect();
    let mut words: Vec<String> = Vec::new();
    let mut current = String::new();

    for (i, &c) in chars.iter().enumerate() {
        if is_separator(c) {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            continue;
        }

        if c.is_uppercase() && !current.is_empty() {
            let prev = chars[i - 1];
            let next_is_lower = chars.get(i + 1).is_some_and(|n| n.is_lowercase());
            if prev.is_lowercase() || prev.is_numeric() || (prev.is_uppercase() && next_is_lower) {
                words.push(std::mem::take(&mut current));
            }
        }
        current.push(c);
    }
    if !current.is_empty() {
        words.push(current);
    }

    merge_single_letters(words)
}

/// Rattache un mot d'une lettre au mot qui le suit (`adres_a_b2` → `adres` + `ab2`)
///
/// Sans cela `adresAB2`, produit par `adres_a_b2`, serait relu comme
/// `adres` + `AB2` et camel_case ne serait pas idempotent. Le premier mot
/// n'est pas concerné : il est écrit en minuscules.
fn merge_single_letters(words: Vec<String>) -> Vec<String> {
    let mut merged: Vec<String> = Vec::with_capacity(words.len());
    let mut absorb_next = false;

    for word in words {
        if absorb_next {
            if let Some(last) = merged.last_mut() {
                last.push_str(&word);
            }
            absorb_next = false;
            continue;
        }
        absorb_next = !merged.is_empty() && is_single_letter(&word);
        merged.push(word);
    }
    merged
}

fn is_single_letter(word: &str) -> bool {
    let mut chars = word.chars();
    matches!((chars.next(), chars.next()), (Some(c), None) if c.is_alphabetic())
}
