use serde::Deserialize;

pub const LOGIN_SUCCESS: &str = "success";

/* {"message":"success","session_id":"...","manager_token":"...","is_consumer":true} */
#[derive(Debug, Deserialize)]
pub struct Login {
    pub message: String,
    #[serde(default)]
    pub session_id: Option<String>,
}

/* {"generation_time":1678000000,"token":"eyJraWQ...","expires_at":1709536000} */
#[derive(Debug, Deserialize)]
pub struct Token {
    pub token: String,
    #[serde(default)]
    pub expires_at: Option<i64>,
}
