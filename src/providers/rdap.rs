// RDAP ownership lookup.
//
// RDAP is the JSON-over-HTTP successor to WHOIS. `GET {base}/ip/{ip}` returns
// the network object covering the address, with contact entities carrying
// jCard (RFC 7095) vCards. rdap.org redirects to the responsible RIR, and
// reqwest follows the redirect.
//
// No credential is needed, so this section degrades only on network or
// payload failures.

use std::net::IpAddr;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;

use super::models::{OwnerInfo, NOT_AVAILABLE};
use super::traits::Provider;
use crate::error::ProviderError;

/// Contact roles consulted for email/phone/address, most useful first.
const CONTACT_ROLES: [&str; 4] = ["registrant", "abuse", "administrative", "technical"];

pub struct RdapClient {
    client: Client,
    base_url: String,
}

impl RdapClient {
    pub fn new(client: Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: super::normalize_base_url(base_url),
        }
    }
}

#[async_trait]
impl Provider for RdapClient {
    type Info = OwnerInfo;

    fn name(&self) -> &'static str {
        "rdap"
    }

    async fn fetch(&self, ip: IpAddr) -> Result<OwnerInfo, ProviderError> {
        let url = format!("{}/ip/{}", self.base_url, ip);
        let request = self
            .client
            .get(&url)
            .header(reqwest::header::ACCEPT, "application/rdap+json");

        let network: RdapNetwork = super::get_json(request).await?;
        Ok(owner_from_rdap(&network))
    }
}

/// Map an RDAP network object into OwnerInfo.
pub fn owner_from_rdap(network: &RdapNetwork) -> OwnerInfo {
    let contacts = flatten_entities(&network.entities);

    let organization = contacts
        .iter()
        .find(|(roles, card)| has_role(roles, "registrant") && card.full_name.is_some())
        .or_else(|| contacts.iter().find(|(_, card)| card.full_name.is_some()))
        .and_then(|(_, card)| card.full_name.clone())
        .or_else(|| network.name.clone())
        .unwrap_or_else(|| NOT_AVAILABLE.to_string());

    // Pick each contact field from the highest-priority role that has it
    let pick = |field: fn(&VCard) -> Option<&String>| -> Option<String> {
        CONTACT_ROLES.iter().find_map(|role| {
            contacts
                .iter()
                .filter(|(roles, _)| has_role(roles, role))
                .find_map(|(_, card)| field(card).cloned())
        })
    };

    OwnerInfo {
        organization,
        name: network.name.clone(),
        email: pick(|c| c.email.as_ref()),
        phone: pick(|c| c.phone.as_ref()),
        address: pick(|c| c.address.as_ref()),
        created_date: event_date(network, "registration"),
        updated_date: event_date(network, "last changed"),
    }
}

fn has_role(roles: &[String], role: &str) -> bool {
    roles.iter().any(|r| r.eq_ignore_ascii_case(role))
}

fn event_date(network: &RdapNetwork, action: &str) -> Option<String> {
    network
        .events
        .iter()
        .find(|e| e.event_action.eq_ignore_ascii_case(action))
        .map(|e| e.event_date.clone())
}

/// Walk entities depth-first, pairing each with its parsed vCard.
fn flatten_entities(entities: &[RdapEntity]) -> Vec<(Vec<String>, VCard)> {
    let mut out = Vec::new();
    for entity in entities {
        let card = entity
            .vcard_array
            .as_ref()
            .map(VCard::from_jcard)
            .unwrap_or_default();
        out.push((entity.roles.clone(), card));
        out.extend(flatten_entities(&entity.entities));
    }
    out
}

/// The handful of vCard properties the report uses.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct VCard {
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
}

impl VCard {
    /// Parse a jCard value: `["vcard", [[name, params, type, value], ...]]`.
    /// Unknown or malformed properties are skipped. First occurrence wins.
    pub fn from_jcard(jcard: &Value) -> Self {
        let mut card = VCard::default();
        let Some(properties) = jcard.get(1).and_then(Value::as_array) else {
            return card;
        };

        for property in properties {
            let Some(parts) = property.as_array() else {
                continue;
            };
            let Some(name) = parts.first().and_then(Value::as_str) else {
                continue;
            };
            let params = parts.get(1);
            let value = parts.get(3);

            match name {
                "fn" => set_once(&mut card.full_name, value.and_then(text_value)),
                "email" => set_once(&mut card.email, value.and_then(text_value)),
                "tel" => set_once(
                    &mut card.phone,
                    value
                        .and_then(text_value)
                        .map(|t| t.trim_start_matches("tel:").to_string()),
                ),
                "adr" => {
                    // Prefer the formatted label; fall back to the structured parts
                    let label = params
                        .and_then(|p| p.get("label"))
                        .and_then(Value::as_str)
                        .map(|l| join_non_empty(l.lines()));
                    let structured = value.map(|v| {
                        let mut parts = Vec::new();
                        collect_strings(v, &mut parts);
                        join_non_empty(parts.iter().map(String::as_str))
                    });
                    set_once(&mut card.address, label.or(structured));
                }
                _ => {}
            }
        }

        card
    }
}

fn set_once(slot: &mut Option<String>, value: Option<String>) {
    if slot.is_none() {
        *slot = value.filter(|v| !v.trim().is_empty());
    }
}

fn text_value(value: &Value) -> Option<String> {
    value.as_str().map(|s| s.trim().to_string())
}

fn collect_strings(value: &Value, out: &mut Vec<String>) {
    match value {
        Value::String(s) => out.push(s.clone()),
        Value::Array(items) => items.iter().for_each(|v| collect_strings(v, out)),
        _ => {}
    }
}

fn join_non_empty<'a>(parts: impl Iterator<Item = &'a str>) -> String {
    parts
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join(", ")
}

// --- RDAP response types ---

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RdapNetwork {
    pub handle: Option<String>,
    pub name: Option<String>,
    #[serde(default)]
    pub entities: Vec<RdapEntity>,
    #[serde(default)]
    pub events: Vec<RdapEvent>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RdapEntity {
    #[serde(default)]
    pub roles: Vec<String>,
    pub vcard_array: Option<Value>,
    #[serde(default)]
    pub entities: Vec<RdapEntity>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RdapEvent {
    pub event_action: String,
    pub event_date: String,
}
