use std::collections::BTreeMap;
use std::net::{Ipv4Addr, Ipv6Addr};

use bosh_bootloader::cloudconfig::{NetworksGenerator, SubnetInput};
use bosh_bootloader::network::{CidrBlock, Ip};
use bosh_bootloader::template::{Output, Parameter, Template};
use proptest::prelude::*;
use serde_json::json;

fn template_strategy() -> impl Strategy<Value = Template> {
    (
        prop::collection::btree_map("[a-d]", "[x-z]", 0..4),
        prop::collection::btree_map("[a-d]", 0u8..4, 0..4),
    )
        .prop_map(|(parameters, outputs)| {
            let mut template = Template::new();
            for (name, default) in parameters {
                template = template.with_parameter(name, Parameter::string(default, ""));
            }
            for (name, value) in outputs {
                template = template.with_output(name, Output::new(json!(value)));
            }
            template
        })
}

proptest! {
    #[test]
    fn v4_last_ip_wraps_to_first_only_for_the_whole_space(addr in any::<u32>(), prefix in 0u8..=32) {
        let text = format!("{}/{prefix}", Ipv4Addr::from(addr));
        let block = CidrBlock::parse(&text).unwrap();
        if prefix == 0 {
            prop_assert_eq!(block.last_ip().add(1), block.first_ip());
        } else {
            prop_assert_ne!(block.last_ip().add(1), block.first_ip());
        }
        if prefix < 32 {
            prop_assert_ne!(block.last_ip(), block.first_ip());
        }
    }

    #[test]
    fn v4_add_then_subtract_is_identity(addr in any::<u32>(), n in any::<u32>()) {
        let ip = Ip::v4(Ipv4Addr::from(addr));
        let n = u128::from(n);
        prop_assume!(ip.checked_add(n).is_some());
        prop_assert_eq!(ip.add(n).subtract(n), ip);
    }

    #[test]
    fn v6_add_then_subtract_is_identity(addr in any::<u128>(), n in any::<u128>()) {
        let ip = Ip::v6(Ipv6Addr::from(addr));
        prop_assume!(ip.checked_add(n).is_some());
        prop_assert_eq!(ip.add(n).subtract(n), ip);
    }

    #[test]
    fn merge_is_associative(a in template_strategy(), b in template_strategy(), c in template_strategy()) {
        let left = a.clone().merge([b.clone()]).merge([c.clone()]);
        let flat = a.clone().merge([b.clone(), c.clone()]);
        let right = a.merge([b.merge([c])]);
        prop_assert_eq!(&left, &flat);
        prop_assert_eq!(&flat, &right);
    }

    #[test]
    fn subnet_layout_brackets_the_block(third in 0u8..=255, prefix in 16u8..=24) {
        let cidr = format!("10.{third}.0.0/{prefix}");
        let block = CidrBlock::parse(&cidr).unwrap();
        let networks = NetworksGenerator::new(
            vec![SubnetInput {
                az: "a".into(),
                subnet: "s".into(),
                cidr: cidr.clone(),
                security_groups: Vec::new(),
            }],
            BTreeMap::from([("a".to_string(), "z1".to_string())]),
        )
        .generate()
        .unwrap();
        let subnet = &networks[0].subnets[0];
        let first = block.first_ip();
        let last = block.last_ip();
        prop_assert_eq!(&subnet.gateway, &first.add(1).to_string());
        let reserved_end = format!("-{}", first.add(3));
        prop_assert!(subnet.reserved[0].ends_with(&reserved_end));
        prop_assert_eq!(&subnet.reserved[1], &last.to_string());
        let static_end = format!("-{}", last.subtract(1));
        prop_assert!(subnet.static_ips[0].ends_with(&static_end));
    }
}
