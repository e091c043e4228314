//! Constructors for CloudFormation intrinsic function values.

use serde_json::{Value, json};

pub const AWS_REGION: &str = "AWS::Region";

/// `{"Ref": name}`
pub fn reference(name: &str) -> Value {
    json!({ "Ref": name })
}

/// `{"Fn::GetAtt": [resource, attribute]}`
pub fn get_att(resource: &str, attribute: &str) -> Value {
    json!({ "Fn::GetAtt": [resource, attribute] })
}

pub fn join(delimiter: &str, parts: Vec<Value>) -> Value {
    json!({ "Fn::Join": [delimiter, parts] })
}

pub fn find_in_map(map: &str, top_level_key: Value, second_level_key: &str) -> Value {
    json!({ "Fn::FindInMap": [map, top_level_key, second_level_key] })
}

pub fn select(index: usize, list: Value) -> Value {
    json!({ "Fn::Select": [index.to_string(), list] })
}

pub fn get_azs(region: Value) -> Value {
    json!({ "Fn::GetAZs": region })
}
