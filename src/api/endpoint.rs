pub type Endpoint = str;

pub const LOGIN: &Endpoint = "/dyn/login.json";
pub const GET_VALUES: &Endpoint = "/dyn/getValues.json";
