use crate::template::intrinsic::{get_att, reference};
use crate::template::properties::{
    IamAccessKeyProperties, IamPolicy, IamPolicyDocument, IamStatement, IamUserProperties,
};
use crate::template::{Output, Resource, Template};

const CPI_EC2_ACTIONS: &[&str] = &[
    "ec2:AssociateAddress",
    "ec2:AttachVolume",
    "ec2:CreateVolume",
    "ec2:DeleteSnapshot",
    "ec2:DeleteVolume",
    "ec2:DescribeAddresses",
    "ec2:DescribeImages",
    "ec2:DescribeInstances",
    "ec2:DescribeRegions",
    "ec2:DescribeSecurityGroups",
    "ec2:DescribeSnapshots",
    "ec2:DescribeSubnets",
    "ec2:DescribeVolumes",
    "ec2:DetachVolume",
    "ec2:CreateSnapshot",
    "ec2:CreateTags",
    "ec2:RunInstances",
    "ec2:TerminateInstances",
    "ec2:RegisterImage",
    "ec2:DeregisterImage",
];

fn allow(actions: &[&str]) -> IamStatement {
    IamStatement {
        action: actions.iter().map(|action| action.to_string()).collect(),
        effect: "Allow".to_string(),
        resource: "*".to_string(),
    }
}

/// IAM user with the inline policy the BOSH AWS CPI needs, plus an access key.
pub fn bosh_iam_user(user_name: &str) -> Template {
    let policy = IamPolicy {
        policy_name: "aws-cpi".to_string(),
        policy_document: IamPolicyDocument {
            version: "2012-10-17".to_string(),
            statement: vec![
                allow(CPI_EC2_ACTIONS),
                allow(&["elasticloadbalancing:*"]),
                allow(&["iam:PassRole"]),
            ],
        },
    };

    let user_name = (!user_name.is_empty()).then(|| user_name.to_string());

    Template::new()
        .with_resource(
            "BOSHUser",
            Resource::new(
                "AWS::IAM::User",
                IamUserProperties {
                    user_name,
                    policies: vec![policy],
                },
            ),
        )
        .with_resource(
            "BOSHUserAccessKey",
            Resource::new(
                "AWS::IAM::AccessKey",
                IamAccessKeyProperties {
                    user_name: reference("BOSHUser"),
                },
            ),
        )
        .with_output("BOSHUserAccessKey", Output::new(reference("BOSHUserAccessKey")))
        .with_output(
            "BOSHUserSecretAccessKey",
            Output::new(get_att("BOSHUserAccessKey", "SecretAccessKey")),
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn blank_user_name_lets_cloudformation_choose() {
        let template = bosh_iam_user("");
        let encoded = serde_json::to_value(&template.resources["BOSHUser"]).unwrap();
        assert!(encoded["Properties"].get("UserName").is_none());
    }

    #[test]
    fn policy_grants_cpi_actions() {
        let template = bosh_iam_user("bosh-iam-user-env");
        let encoded = serde_json::to_value(&template.resources["BOSHUser"]).unwrap();
        let statement = &encoded["Properties"]["Policies"][0]["PolicyDocument"]["Statement"];
        assert_eq!(statement[1]["Action"], json!(["elasticloadbalancing:*"]));
        assert_eq!(encoded["Properties"]["UserName"], json!("bosh-iam-user-env"));
    }
}
