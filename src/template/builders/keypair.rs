use crate::template::{Parameter, Template};

pub const SSH_KEY_PAIR_PARAMETER: &str = "SSHKeyPairName";

pub fn ssh_key_pair(key_pair_name: &str) -> Template {
    Template::new().with_parameter(
        SSH_KEY_PAIR_PARAMETER,
        Parameter::typed(
            "AWS::EC2::KeyPair::KeyName",
            key_pair_name,
            "SSH KeyPair to use for instances",
        ),
    )
}
