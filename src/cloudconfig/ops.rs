//! Ops-file generation from live stack outputs, and an applier for BOSH-style
//! patch paths (`/azs/name=z1/cloud_properties?`, `/vm_extensions?/-`).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use tracing::debug;

use crate::cloudconfig::generator::{
    VmExtension, VmExtensionCloudProperties, az_label,
};
use crate::cloudconfig::networks::{DEFAULT_STATIC_POOL_SIZE, NetworksGenerator, SubnetInput};
use crate::error::{BblError, Result};
use crate::template::builders::load_balancers::{
    CF_ISO_SEG_ROUTER, CF_ROUTER, CF_SSH_PROXY, CONCOURSE, internal_security_group_name,
    load_balancer_name,
};
use crate::template::builders::security_groups::INTERNAL_SECURITY_GROUP;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OpKind {
    Replace,
    Remove,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Op {
    #[serde(rename = "type")]
    pub kind: OpKind,
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
}

impl Op {
    pub fn replace(path: impl Into<String>, value: Value) -> Self {
        Self {
            kind: OpKind::Replace,
            path: path.into(),
            value: Some(value),
        }
    }

    pub fn remove(path: impl Into<String>) -> Self {
        Self {
            kind: OpKind::Remove,
            path: path.into(),
            value: None,
        }
    }
}

pub fn to_yaml(ops: &[Op]) -> Result<String> {
    Ok(serde_yaml_bw::to_string(ops)?)
}

/// VM extension name of each load balancer family, in emission order.
const LOAD_BALANCER_EXTENSIONS: &[(&str, &str)] = &[
    (CF_ROUTER, "cf-router-network-properties"),
    (CF_SSH_PROXY, "diego-ssh-proxy-network-properties"),
    (CF_ISO_SEG_ROUTER, "cf-iso-seg-router-network-properties"),
    (CONCOURSE, "lb"),
];

#[derive(Debug, Clone)]
pub struct OpsGenerator {
    static_pool_size: u32,
}

impl Default for OpsGenerator {
    fn default() -> Self {
        Self {
            static_pool_size: DEFAULT_STATIC_POOL_SIZE,
        }
    }
}

impl OpsGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_static_pool_size(mut self, size: u32) -> Self {
        self.static_pool_size = size;
        self
    }

    /// Derives the ops that turn [`CloudConfigGenerator::base`] into the AWS
    /// cloud-config for a stack with these outputs.
    ///
    /// Zones follow the `InternalSubnet{N}AZ` outputs in ascending `N`; load
    /// balancer extensions are appended for every `<Family>LoadBalancer`
    /// output present.
    ///
    /// [`CloudConfigGenerator::base`]: crate::cloudconfig::CloudConfigGenerator::base
    pub fn generate(&self, outputs: &BTreeMap<String, String>) -> Result<Vec<Op>> {
        let output = |key: String| {
            outputs
                .get(&key)
                .cloned()
                .ok_or(BblError::MissingOutput { key })
        };

        let mut suffixes: Vec<usize> = outputs
            .keys()
            .filter_map(|key| {
                key.strip_prefix("InternalSubnet")?
                    .strip_suffix("AZ")?
                    .parse()
                    .ok()
            })
            .filter(|n: &usize| *n > 0)
            .collect();
        suffixes.sort_unstable();

        let internal_group = output(INTERNAL_SECURITY_GROUP.to_string())?;
        let mut ops = Vec::new();
        let mut subnets = Vec::new();
        let mut az_associations = BTreeMap::new();

        for n in suffixes {
            let az = output(format!("InternalSubnet{n}AZ"))?;
            let label = az_label(n - 1);
            ops.push(Op::replace(
                format!("/azs/name={label}/cloud_properties?"),
                json!({ "availability_zone": az }),
            ));
            az_associations.insert(az.clone(), label);
            subnets.push(SubnetInput {
                az,
                subnet: output(format!("InternalSubnet{n}Name"))?,
                cidr: output(format!("InternalSubnet{n}CIDR"))?,
                security_groups: vec![internal_group.clone()],
            });
        }

        let networks = NetworksGenerator::new(subnets, az_associations)
            .with_static_pool_size(self.static_pool_size)
            .generate()?;
        let subnets = networks
            .into_iter()
            .next()
            .map(|network| serde_json::to_value(network.subnets))
            .transpose()?
            .unwrap_or_else(|| json!([]));
        for network in ["private", "default"] {
            ops.push(Op::replace(
                format!("/networks/name={network}/subnets?"),
                subnets.clone(),
            ));
        }

        for (prefix, extension) in LOAD_BALANCER_EXTENSIONS {
            let Some(elb) = outputs.get(&load_balancer_name(prefix)) else {
                continue;
            };
            let extension = VmExtension {
                name: extension.to_string(),
                cloud_properties: VmExtensionCloudProperties {
                    elbs: vec![elb.clone()],
                    security_groups: vec![
                        output(internal_security_group_name(prefix))?,
                        internal_group.clone(),
                    ],
                },
            };
            ops.push(Op::replace(
                "/vm_extensions?/-",
                serde_json::to_value(extension)?,
            ));
        }

        debug!(ops = ops.len(), "generated ops-file");
        Ok(ops)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Key(String),
    Index(usize),
    Matcher { key: String, value: String },
    Append,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Token {
    segment: Segment,
    optional: bool,
}

fn parse_path(path: &str) -> Result<Vec<Token>> {
    if path.is_empty() {
        return Ok(Vec::new());
    }
    let rest = path.strip_prefix('/').ok_or_else(|| BblError::Ops {
        path: path.to_string(),
        reason: "must start with '/'".to_string(),
    })?;

    let mut optional = false;
    let mut tokens = Vec::new();
    for raw in rest.split('/') {
        let raw = match raw.strip_suffix('?') {
            Some(stripped) => {
                optional = true;
                stripped
            }
            None => raw,
        };
        let raw = raw.replace("~1", "/").replace("~0", "~");
        let segment = if raw == "-" {
            Segment::Append
        } else if let Ok(index) = raw.parse::<usize>() {
            Segment::Index(index)
        } else if let Some((key, value)) = raw.split_once('=') {
            Segment::Matcher {
                key: key.to_string(),
                value: value.to_string(),
            }
        } else {
            Segment::Key(raw)
        };
        tokens.push(Token { segment, optional });
    }
    Ok(tokens)
}

/// Empty value a missing optional segment is materialized as, chosen by the
/// segment that will descend into it.
fn container_for(next: &Segment) -> Value {
    match next {
        Segment::Key(_) => Value::Object(Map::new()),
        _ => Value::Array(Vec::new()),
    }
}

fn ops_error(path: &str, reason: impl Into<String>) -> BblError {
    BblError::Ops {
        path: path.to_string(),
        reason: reason.into(),
    }
}

fn as_map<'a>(node: &'a mut Value, path: &str) -> Result<&'a mut Map<String, Value>> {
    node.as_object_mut()
        .ok_or_else(|| ops_error(path, "expected a map"))
}

fn as_list<'a>(node: &'a mut Value, path: &str) -> Result<&'a mut Vec<Value>> {
    node.as_array_mut()
        .ok_or_else(|| ops_error(path, "expected a list"))
}

fn position(items: &[Value], key: &str, value: &str) -> Option<usize> {
    items
        .iter()
        .position(|item| item.get(key).and_then(Value::as_str) == Some(value))
}

fn replace_at(node: &mut Value, tokens: &[Token], value: Value, path: &str) -> Result<()> {
    let Some((token, rest)) = tokens.split_first() else {
        *node = value;
        return Ok(());
    };

    match &token.segment {
        Segment::Key(key) => {
            let map = as_map(node, path)?;
            if rest.is_empty() {
                map.insert(key.clone(), value);
                return Ok(());
            }
            let child = match map.entry(key.clone()) {
                serde_json::map::Entry::Occupied(entry) => entry.into_mut(),
                serde_json::map::Entry::Vacant(entry) if token.optional => {
                    entry.insert(container_for(&rest[0].segment))
                }
                serde_json::map::Entry::Vacant(_) => {
                    return Err(ops_error(path, format!("missing key '{key}'")));
                }
            };
            replace_at(child, rest, value, path)
        }
        Segment::Index(index) => {
            let items = as_list(node, path)?;
            let len = items.len();
            let child = items
                .get_mut(*index)
                .ok_or_else(|| ops_error(path, format!("index {index} out of range ({len})")))?;
            replace_at(child, rest, value, path)
        }
        Segment::Append => {
            let items = as_list(node, path)?;
            let mut child = match rest.first() {
                Some(next) => container_for(&next.segment),
                None => Value::Null,
            };
            replace_at(&mut child, rest, value, path)?;
            items.push(child);
            Ok(())
        }
        Segment::Matcher { key, value: wanted } => {
            let items = as_list(node, path)?;
            match position(items, key, wanted) {
                Some(index) => replace_at(&mut items[index], rest, value, path),
                None if token.optional => {
                    let mut child = Value::Object(Map::from_iter([(
                        key.clone(),
                        Value::String(wanted.clone()),
                    )]));
                    replace_at(&mut child, rest, value, path)?;
                    items.push(child);
                    Ok(())
                }
                None => Err(ops_error(path, format!("no element with {key}={wanted}"))),
            }
        }
    }
}

fn remove_at(node: &mut Value, tokens: &[Token], path: &str) -> Result<()> {
    let Some((token, rest)) = tokens.split_first() else {
        return Err(ops_error(path, "cannot remove the document root"));
    };
    let missing = |what: String| {
        if token.optional {
            Ok(())
        } else {
            Err(ops_error(path, what))
        }
    };

    match &token.segment {
        Segment::Key(key) => {
            let map = as_map(node, path)?;
            if rest.is_empty() {
                return match map.remove(key) {
                    Some(_) => Ok(()),
                    None => missing(format!("missing key '{key}'")),
                };
            }
            match map.get_mut(key) {
                Some(child) => remove_at(child, rest, path),
                None => missing(format!("missing key '{key}'")),
            }
        }
        Segment::Index(index) => {
            let items = as_list(node, path)?;
            if *index >= items.len() {
                return missing(format!("index {index} out of range ({})", items.len()));
            }
            if rest.is_empty() {
                items.remove(*index);
                Ok(())
            } else {
                remove_at(&mut items[*index], rest, path)
            }
        }
        Segment::Append => Err(ops_error(path, "'-' cannot be removed")),
        Segment::Matcher { key, value } => {
            let items = as_list(node, path)?;
            match position(items, key, value) {
                Some(index) if rest.is_empty() => {
                    items.remove(index);
                    Ok(())
                }
                Some(index) => remove_at(&mut items[index], rest, path),
                None => missing(format!("no element with {key}={value}")),
            }
        }
    }
}

/// Applies `ops` in order to a copy of `document`.
pub fn apply_ops(document: &Value, ops: &[Op]) -> Result<Value> {
    let mut document = document.clone();
    for op in ops {
        let tokens = parse_path(&op.path)?;
        match op.kind {
            OpKind::Replace => {
                let value = op
                    .value
                    .clone()
                    .ok_or_else(|| ops_error(&op.path, "replace requires a value"))?;
                replace_at(&mut document, &tokens, value, &op.path)?;
            }
            OpKind::Remove => remove_at(&mut document, &tokens, &op.path)?,
        }
    }
    Ok(document)
}
