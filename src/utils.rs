pub(crate) mod address;
pub(crate) mod cidr;
pub(crate) mod ip_rule;
