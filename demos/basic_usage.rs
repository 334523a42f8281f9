use std::time::Duration;

use entra_auth::EntraTokenValidator;
use entra_auth::EntraValidatorConfig;
use entra_auth::InternalTokenValidator;
use entra_auth::InternalValidatorConfig;
use entra_auth::Requirement;
use entra_auth::ValidateToken;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    // Example 1: Entra ID validator with default settings
    println!("=== Example 1: Entra ID Validator ===");
    let config = EntraValidatorConfig::new("your-tenant-id", "your-client-id");
    let validator = EntraTokenValidator::new(config);

    // Example JWT token (this is just a placeholder - use a real token in practice)
    let token = "eyJhbGciOiJSUzI1NiIsInR5cCI6IkpXVCJ9...";

    let result = validator.validate(token, &Requirement::none()).await;
    if result.is_valid {
        let claims = result.claims.expect("accepted tokens carry claims");
        let user = claims.user_info();
        println!("✓ Token validated!");
        println!("  User: {:?}", user.user_principal_name);
        println!("  Scopes: {:?}", user.scopes);
    } else {
        eprintln!("✗ Token rejected: {}", result.error.unwrap_or_default());
    }

    println!();

    // Example 2: Scope and role requirements with custom leeway and timeout
    println!("=== Example 2: Authorization Requirements ===");
    let custom_client = reqwest::Client::builder()
        .timeout(Duration::from_secs(10))
        .build()?;

    let config = EntraValidatorConfig::new("your-tenant-id", "your-client-id")
        .with_leeway(30)
        .with_max_cached_keys(32)
        .with_http_client(custom_client);
    let validator = EntraTokenValidator::new(config);

    let requirement = Requirement::none()
        .with_scopes(["User.Read", "Files.ReadWrite"])
        .with_roles(["Admin"])
        .require_all_scopes();

    let result = validator.validate(token, &requirement).await;
    if result.is_valid {
        println!("✓ Caller is authorized");
    } else {
        eprintln!("✗ Denied: {}", result.error.unwrap_or_default());
    }

    println!();

    // Example 3: Internal service-to-service tokens with a shared secret
    println!("=== Example 3: Internal Validator ===");
    let config = InternalValidatorConfig::new("your-shared-secret")
        .with_issuer("https://auth.internal.example.com")
        .with_audience("reporting-service");
    let validator = InternalTokenValidator::new(config);

    let result = validator.validate(token, &Requirement::none()).await;
    if result.is_valid {
        println!("✓ Internal token validated!");
    } else {
        eprintln!("✗ Internal token rejected: {}", result.error.unwrap_or_default());
    }

    Ok(())
}
