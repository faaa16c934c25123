use axum::http;
use jsonwebtoken::{decode, Algorithm, DecodingKey, TokenData, Validation};
use serde_json::Value;

// Get the auth token from a request
pub fn get_auth_token<B>(req: &http::Request<B>) -> Result<String, String> {
    // 1. Try to get token from Authorization header
    if let Some(auth_header) = req.headers().get(http::header::AUTHORIZATION) {
        let auth_str = auth_header.to_str().map_err(|_| "Invalid Authorization header".to_string())?;
        Ok(auth_str
            .strip_prefix("Bearer ")
            .unwrap_or(auth_str)
            .to_string())
    }
    // 2. Try to get token from cookies
    else {
        let cookie_header = req.headers().get(http::header::COOKIE)
            .ok_or_else(|| "Missing Authorization header or Cookie".to_string())?
            .to_str()
            .map_err(|_| "Invalid Cookie header".to_string())?;

        for c in cookie::Cookie::split_parse(cookie_header).flatten() {
            if c.name() == "auth_token" {
                return Ok(c.value().to_string());
            }
        }
        Err("auth_token cookie not found".to_string())
    }
}

// Validate a JWT token and return the token data
pub fn validate_jwt(token: &str, secret: &str) -> Result<TokenData<Value>, jsonwebtoken::errors::Error> {
    let validation = Validation::new(Algorithm::HS256);
    let decoding_key = DecodingKey::from_secret(secret.as_bytes());
    decode::<Value>(token, &decoding_key, &validation)
}

fn string_list(claims: &Value, name: &str) -> Vec<String> {
    match claims.get(name).and_then(|v| v.as_array()) {
        Some(items) => items.iter().filter_map(|r| r.as_str().map(|s| s.to_string())).collect(),
        None => Vec::new(),
    }
}

/// Principals granted by a validated token.
///
/// `u/<sub>` or `s/<sub>` depending on the `type` claim, then `r/<role>` for each
/// role and `p/<permission>` for each permission.
pub fn principals_from_claims(claims: &Value) -> Result<Vec<String>, String> {
    let sub = claims
        .get("sub")
        .and_then(|v| v.as_str())
        .ok_or_else(|| "JWT token does not contain 'sub' claim".to_string())?;
    let token_type = claims
        .get("type")
        .and_then(|v| v.as_str())
        .ok_or_else(|| "JWT token does not contain 'type' claim".to_string())?;

    let mut prpls = match token_type {
        "user" => vec![format!("u/{}", sub)],
        "service" => vec![format!("s/{}", sub)],
        other => return Err(format!("Invalid token type: {}", other)),
    };

    for role in string_list(claims, "roles") {
        let role_prpl = format!("r/{}", role);
        if !prpls.contains(&role_prpl) {
            prpls.push(role_prpl);
        }
    }
    for permission in string_list(claims, "permissions") {
        let permission_prpl = format!("p/{}", permission);
        if !prpls.contains(&permission_prpl) {
            prpls.push(permission_prpl);
        }
    }
    Ok(prpls)
}
