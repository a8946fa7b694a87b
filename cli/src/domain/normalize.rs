//! Manifest normalization: turn engine-rendered manifests into stable,
//! chart-ready documents.
//!
//! Steps, applied to the whole document set:
//! 1. Auto-named resources lose their `-xxxxxxxx` hash suffix, and every
//!    reference to the old name is rewritten.
//! 2. When two ServiceAccounts collide after stripping, the one without
//!    the agent label becomes `worker-service-account`.
//! 3. `pulumi.com/*` annotations are dropped.
//! 4. `Secret.data` is base64-decoded into `stringData`.

use std::collections::{BTreeMap, HashMap};
use std::sync::LazyLock;

use anyhow::{Context, Result};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use regex::Regex;
use serde::Deserialize;
use serde_yaml::{Mapping, Value};

use crate::domain::compose::cluster::APP_LABEL;

pub const AUTONAMED_ANNOTATION: &str = "pulumi.com/autonamed";
pub const ENGINE_ANNOTATION_PREFIX: &str = "pulumi.com/";
pub const WORKER_SA_NAME: &str = "worker-service-account";

#[allow(clippy::expect_used)]
static HASH_SUFFIX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"-[0-9a-f]{8}$").expect("valid regex"));

/// Identity of a normalized document, for progress output.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceId {
    pub api_version: String,
    pub kind: String,
    pub name: String,
}

/// Split a YAML stream into object documents, skipping empty documents and
/// anything without an `apiVersion`.
///
/// # Errors
///
/// Returns an error if the stream is not valid YAML.
pub fn split_documents(content: &str) -> Result<Vec<Mapping>> {
    let mut docs = Vec::new();
    for de in serde_yaml::Deserializer::from_str(content) {
        let value = Value::deserialize(de).context("parsing YAML document")?;
        if let Value::Mapping(m) = value
            && m.contains_key("apiVersion")
        {
            docs.push(m);
        }
    }
    Ok(docs)
}

fn str_at<'a>(m: &'a Mapping, key: &str) -> Option<&'a str> {
    m.get(key).and_then(Value::as_str)
}

fn map_at<'a>(m: &'a Mapping, key: &str) -> Option<&'a Mapping> {
    m.get(key).and_then(Value::as_mapping)
}

fn meta(doc: &Mapping) -> Option<&Mapping> {
    map_at(doc, "metadata")
}

fn name_of(doc: &Mapping) -> Option<&str> {
    meta(doc).and_then(|m| str_at(m, "name"))
}

fn kind_of(doc: &Mapping) -> &str {
    str_at(doc, "kind").unwrap_or_default()
}

#[must_use]
pub fn resource_id(doc: &Mapping) -> ResourceId {
    ResourceId {
        api_version: str_at(doc, "apiVersion").unwrap_or_default().to_string(),
        kind: kind_of(doc).to_string(),
        name: name_of(doc).unwrap_or_default().to_string(),
    }
}

/// Hashed name → clean name, for auto-named resources only.
#[must_use]
pub fn build_name_map(docs: &[Mapping]) -> HashMap<String, String> {
    docs.iter()
        .filter_map(|doc| {
            let m = meta(doc)?;
            let name = str_at(m, "name")?;
            let autonamed = map_at(m, "annotations")
                .and_then(|a| str_at(a, AUTONAMED_ANNOTATION))
                == Some("true");
            let clean = HASH_SUFFIX_RE.replace(name, "");
            (autonamed && clean != name).then(|| (name.to_string(), clean.into_owned()))
        })
        .collect()
}

fn clean_name(names: &HashMap<String, String>, hashed: &str) -> String {
    names
        .get(hashed)
        .cloned()
        .unwrap_or_else(|| hashed.to_string())
}

/// Rename the unlabeled ServiceAccount when two would share a clean name.
pub fn disambiguate_service_accounts(docs: &[Mapping], names: &mut HashMap<String, String>) {
    let accounts: Vec<(String, bool)> = docs
        .iter()
        .filter(|d| kind_of(d) == "ServiceAccount")
        .filter_map(|d| {
            let m = meta(d)?;
            let name = str_at(m, "name")?.to_string();
            let labelled = map_at(m, "labels").and_then(|l| str_at(l, APP_LABEL.0)) == Some(APP_LABEL.1);
            Some((name, labelled))
        })
        .collect();
    if accounts.len() < 2 {
        return;
    }

    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for (hashed, _) in &accounts {
        *counts.entry(clean_name(names, hashed)).or_default() += 1;
    }
    for (hashed, labelled) in &accounts {
        if !labelled && counts.get(&clean_name(names, hashed)).copied().unwrap_or_default() > 1 {
            names.insert(hashed.clone(), WORKER_SA_NAME.to_string());
        }
    }
}

/// Replace every string scalar equal to an old name, anywhere in the tree.
fn apply_name_map(value: &mut Value, names: &HashMap<String, String>) {
    match value {
        Value::String(s) => {
            if let Some(new) = names.get(s.as_str()) {
                s.clone_from(new);
            }
        }
        Value::Sequence(seq) => seq.iter_mut().for_each(|v| apply_name_map(v, names)),
        Value::Mapping(m) => m.values_mut().for_each(|v| apply_name_map(v, names)),
        Value::Tagged(t) => apply_name_map(&mut t.value, names),
        _ => {}
    }
}

fn remove_engine_annotations(doc: &mut Mapping) {
    let Some(Value::Mapping(m)) = doc.get_mut("metadata") else {
        return;
    };
    let Some(Value::Mapping(annotations)) = m.get_mut("annotations") else {
        return;
    };
    annotations.retain(|k, _| {
        !k.as_str()
            .is_some_and(|k| k.starts_with(ENGINE_ANNOTATION_PREFIX))
    });
    if annotations.is_empty() {
        m.remove("annotations");
    }
}

fn decode_text(s: &str) -> Option<String> {
    String::from_utf8(STANDARD.decode(s).ok()?).ok()
}

/// Values that are not valid base64 UTF-8 text are kept as-is.
fn decode_secret_data(doc: &mut Mapping) {
    if kind_of(doc) != "Secret" {
        return;
    }
    let Some(Value::Mapping(data)) = doc.remove("data") else {
        return;
    };
    let decoded: Mapping = data
        .into_iter()
        .map(|(k, v)| {
            let v = match v {
                Value::String(s) => Value::String(decode_text(&s).unwrap_or(s)),
                other => other,
            };
            (k, v)
        })
        .collect();
    doc.insert(Value::from("stringData"), Value::Mapping(decoded));
}

/// Run every normalization step over the document set.
#[must_use]
pub fn normalize(mut docs: Vec<Mapping>) -> Vec<Mapping> {
    let mut names = build_name_map(&docs);
    disambiguate_service_accounts(&docs, &mut names);
    for doc in &mut docs {
        if !names.is_empty() {
            doc.values_mut().for_each(|v| apply_name_map(v, &names));
        }
        remove_engine_annotations(doc);
        decode_secret_data(doc);
    }
    docs
}
