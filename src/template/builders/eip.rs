use serde_json::json;

use crate::template::intrinsic::{join, reference};
use crate::template::properties::EipProperties;
use crate::template::{Output, Resource, Template};

pub fn bosh_eip() -> Template {
    Template::new()
        .with_resource(
            "BOSHEIP",
            Resource::new(
                "AWS::EC2::EIP",
                EipProperties {
                    domain: "vpc".to_string(),
                    instance_id: None,
                },
            ),
        )
        .with_output("BOSHEIP", Output::new(reference("BOSHEIP")))
        .with_output(
            "BOSHURL",
            Output::new(join(
                "",
                vec![json!("https://"), reference("BOSHEIP"), json!(":25555")],
            )),
        )
}
