pub type Endpoint = str;

pub const ENLIGHTEN_URL: &str = "https://enlighten.enphaseenergy.com";

/* Cloud, relative to `enlighten_url` */
pub const LOGIN: &Endpoint = "/login/login.json";
pub const TOKEN: &Endpoint = "/entrez-auth-token";

/* Gateway */
pub const CHECK_JWT: &Endpoint = "/auth/check_jwt";
pub const PRODUCTION: &Endpoint = "/production.json?details=1";
pub const HOME: &Endpoint = "/home.json";
pub const INVENTORY: &Endpoint = "/inventory.json";
pub const INFO: &Endpoint = "/info.xml";
pub const INVERTERS: &Endpoint = "/api/v1/production/inverters";

pub const MANAGER_SESSION_COOKIE: &str = "_enlighten_4_session";
pub const LOCAL_SESSION_COOKIE: &str = "sessionId";
