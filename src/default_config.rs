pub const DEFAULT_CONFIG_TOML: &str = r#"[supabase]
url = ""
anon_key = ""
table = "todos"

[gemini]
api_key = ""
model = "gemini-3-flash-preview"
base_url = "https://generativelanguage.googleapis.com"

[http]
timeout_secs = 30
"#;
