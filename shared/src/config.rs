use dotenv::dotenv;

pub struct Config {
    pub signer_address: String,
    pub protector_secret: String,
    pub executor_address: String,
    pub executor_api_url: String,
    pub executor_api_token: Option<String>,
    pub redis_url: String,
    pub api_bind: String,
}

impl Config {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenv().ok();

        Ok(Config {
            signer_address: std::env::var("SIGNER_ADDRESS")
                .unwrap_or_else(|_| "0x00A1b2C3d4E5f60718293a4B5c6D7e8F90a1B2c3".to_string()),
            protector_secret: std::env::var("PROTECTOR_SECRET")?,
            executor_address: std::env::var("EXECUTOR_ADDRESS")
                .unwrap_or_else(|_| "0x7f8C5E4B1a9D3f2E6c0A8b7D4e5F6a1B2c3D4e5F".to_string()),
            executor_api_url: std::env::var("EXECUTOR_API_URL")
                .unwrap_or_else(|_| "http://localhost:8545".to_string()),
            executor_api_token: std::env::var("EXECUTOR_API_TOKEN").ok(),
            redis_url: std::env::var("REDIS_URL")
                .unwrap_or_else(|_| "redis://localhost:6379".to_string()),
            api_bind: std::env::var("API_BIND")
                .unwrap_or_else(|_| "0.0.0.0:9999".to_string()),
        })
    }
}
