//! Shared constants and invariants

pub const DEFAULT_PROVIDER_TIMEOUT_MS: u64 = 10_000;

/// One day, the lifetime given to every cache entry without a provider TTL.
pub const DEFAULT_ENTRY_TTL_SECS: u64 = 86_400;

/// Upper bound on a provider-stated token lifetime.
pub const MAX_TOKEN_TTL_SECS: u64 = 365 * 86_400;

pub const FEED_PAGE_SIZE: u32 = 4;

pub const AUTHORIZATION_SCOPES: &str = "instagram_business_basic,instagram_business_manage_messages,instagram_business_manage_comments,instagram_business_content_publish";

pub const MEDIA_FIELDS: &str = "id,caption,media_type,media_url,thumbnail_url,timestamp";
pub const IDENTITY_FIELDS: &str = "id,username";

// Provider endpoints
pub const INSTAGRAM_AUTHORIZE_URL: &str = "https://www.instagram.com/oauth/authorize/";
pub const INSTAGRAM_TOKEN_URL: &str = "https://api.instagram.com/oauth/access_token";
pub const INSTAGRAM_GRAPH_URL: &str = "https://graph.instagram.com";

// Response messages
pub const MSG_TOKEN_FROM_CACHE: &str = "Token loaded from cache";
pub const MSG_TOKEN_VALID: &str = "Token is valid";
pub const MSG_NO_SESSION: &str = "No session found with the provider.";
pub const MSG_SESSION_EXPIRED: &str = "The session has expired.";
pub const MSG_FORBIDDEN: &str = "Access to this resource is not allowed";

/// Referers the frontend sends, compared verbatim.
pub const DEFAULT_ALLOWED_ORIGINS: &[&str] = &[
    "http://localhost:9000/",
    "http://localhost:9200/",
    "https://app.motowork.xyz/",
    "http://localhost:9001/",
    "http://admin.motowork.xyz/",
    "https://admin.motowork.xyz/",
    "http://app.motowork.xyz/",
    "https://motowork.xyz/",
    "http://motowork.xyz/",
    "http://motowork.co",
    "https://motowork.co",
    "http://admin.motowork.co",
    "https://admin.motowork.co",
];

pub const DEFAULT_ALLOWED_HOSTS: &[&str] = &["api.motowork.co"];

pub const DEFAULT_CORS_ORIGINS: &[&str] = &[
    "http://localhost:9000",
    "http://localhost:9200",
    "https://app.motowork.xyz",
    "http://localhost:9001",
    "http://testbanner.test",
    "http://admin.motowork.xyz",
    "https://admin.motowork.xyz",
    "http://app.motowork.xyz",
    "https://motowork.xyz",
    "http://motowork.xyz",
    "http://motowork.co",
    "https://motowork.co",
];
