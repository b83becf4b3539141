//! HS256 bearer-token adapter for the `CredentialValidator` port.
//!
//! Tokens are issued by the identity service and carry the requester's id,
//! a base64-encoded email, the declared base salary and a comma-separated
//! role list. Claim names default to the identity service's and can be
//! overridden through [`JwtClaimNames`].

use std::collections::BTreeSet;
use std::str::FromStr;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use rust_decimal::Decimal;
use serde_json::{Map, Value};
use tracing::debug;

use crate::domain::ports::{CredentialError, CredentialValidator};

const BEARER_PREFIX: &str = "Bearer ";
const STANDARD_SUBJECT_CLAIM: &str = "sub";

/// Names of the claims read from a verified token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JwtClaimNames {
    /// Requester identifier; the registered `sub` claim is the fallback.
    pub subject: String,
    /// Base64-encoded email address.
    pub email: String,
    /// Declared base salary.
    pub income: String,
    /// Comma-separated role names.
    pub roles: String,
}

impl Default for JwtClaimNames {
    fn default() -> Self {
        Self {
            subject: "objectId".to_owned(),
            email: "email".to_owned(),
            income: "salarioBase".to_owned(),
            roles: "roles".to_owned(),
        }
    }
}

/// Verifies HS256 tokens signed with a shared secret.
#[derive(Clone)]
pub struct JwtCredentialValidator {
    key: DecodingKey,
    validation: Validation,
    claims: JwtClaimNames,
}

impl JwtCredentialValidator {
    /// Build a validator over the shared signing secret.
    pub fn new(secret: &[u8], claims: JwtClaimNames) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // Identity tokens are not audience-scoped; `exp` is enforced only
        // when present.
        validation.set_required_spec_claims::<&str>(&[]);
        validation.validate_aud = false;
        Self {
            key: DecodingKey::from_secret(secret),
            validation,
            claims,
        }
    }

    fn verified_claims(&self, credential: &str) -> Result<Map<String, Value>, CredentialError> {
        let token = credential
            .strip_prefix(BEARER_PREFIX)
            .unwrap_or(credential)
            .trim();
        let data = decode::<Map<String, Value>>(token, &self.key, &self.validation).map_err(
            |err| {
                debug!(error = %err, "credential rejected");
                CredentialError::invalid_credential(err.to_string())
            },
        )?;
        Ok(data.claims)
    }

    fn text_claim(claims: &Map<String, Value>, name: &str) -> Option<String> {
        match claims.get(name)? {
            Value::String(text) => Some(text.clone()),
            Value::Number(number) => Some(number.to_string()),
            _ => None,
        }
    }

    fn required_text_claim(
        claims: &Map<String, Value>,
        name: &str,
    ) -> Result<String, CredentialError> {
        Self::text_claim(claims, name).ok_or_else(|| CredentialError::missing_claim(name))
    }
}

impl CredentialValidator for JwtCredentialValidator {
    fn subject(&self, credential: &str) -> Result<String, CredentialError> {
        let claims = self.verified_claims(credential)?;
        Self::text_claim(&claims, &self.claims.subject)
            .or_else(|| Self::text_claim(&claims, STANDARD_SUBJECT_CLAIM))
            .ok_or_else(|| CredentialError::missing_claim(self.claims.subject.as_str()))
    }

    fn email(&self, credential: &str) -> Result<String, CredentialError> {
        let claims = self.verified_claims(credential)?;
        let encoded = Self::required_text_claim(&claims, &self.claims.email)?;
        let bytes = STANDARD
            .decode(encoded.trim())
            .map_err(|err| CredentialError::invalid_credential(format!("email claim: {err}")))?;
        String::from_utf8(bytes)
            .map_err(|err| CredentialError::invalid_credential(format!("email claim: {err}")))
    }

    fn declared_income(&self, credential: &str) -> Result<Decimal, CredentialError> {
        let claims = self.verified_claims(credential)?;
        let raw = Self::required_text_claim(&claims, &self.claims.income)?;
        Decimal::from_str(&raw)
            .or_else(|_| Decimal::from_scientific(&raw))
            .map_err(|err| {
                CredentialError::invalid_credential(format!(
                    "{} claim is not a number: {err}",
                    self.claims.income
                ))
            })
    }

    fn roles(&self, credential: &str) -> Result<BTreeSet<String>, CredentialError> {
        let claims = self.verified_claims(credential)?;
        let roles = Self::text_claim(&claims, &self.claims.roles).unwrap_or_default();
        Ok(roles
            .split(',')
            .map(str::trim)
            .filter(|role| !role.is_empty())
            .map(str::to_owned)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    //! Coverage for token verification and claim decoding.

    use super::*;
    use jsonwebtoken::{EncodingKey, Header, encode};
    use rstest::{fixture, rstest};
    use serde_json::json;

    const SECRET: &[u8] = b"a-test-secret-that-is-long-enough-for-hs256";

    #[fixture]
    fn validator() -> JwtCredentialValidator {
        JwtCredentialValidator::new(SECRET, JwtClaimNames::default())
    }

    fn token_with(claims: &Value, secret: &[u8]) -> String {
        encode(
            &Header::new(Algorithm::HS256),
            claims,
            &EncodingKey::from_secret(secret),
        )
        .expect("token encodes")
    }

    fn token(claims: &Value) -> String {
        token_with(claims, SECRET)
    }

    #[rstest]
    fn subject_prefers_object_id(validator: JwtCredentialValidator) {
        let credential = token(&json!({ "objectId": "17", "sub": "ana@example.com" }));
        assert_eq!(validator.subject(&credential).expect("subject"), "17");
    }

    #[rstest]
    fn subject_falls_back_to_sub(validator: JwtCredentialValidator) {
        let credential = token(&json!({ "sub": "42" }));
        assert_eq!(validator.subject(&credential).expect("subject"), "42");
    }

    #[rstest]
    fn numeric_object_id_reads_as_text(validator: JwtCredentialValidator) {
        let credential = token(&json!({ "objectId": 17 }));
        assert_eq!(validator.subject(&credential).expect("subject"), "17");
    }

    #[rstest]
    fn bearer_prefix_is_accepted(validator: JwtCredentialValidator) {
        let credential = format!("Bearer {}", token(&json!({ "objectId": "5" })));
        assert_eq!(validator.subject(&credential).expect("subject"), "5");
    }

    #[rstest]
    fn email_claim_is_base64_decoded(validator: JwtCredentialValidator) {
        let credential = token(&json!({ "email": STANDARD.encode("ana@example.com") }));
        assert_eq!(validator.email(&credential).expect("email"), "ana@example.com");
    }

    #[rstest]
    fn undecodable_email_is_invalid(validator: JwtCredentialValidator) {
        let credential = token(&json!({ "email": "not base64!" }));
        assert!(matches!(
            validator.email(&credential),
            Err(CredentialError::InvalidCredential { .. })
        ));
    }

    #[rstest]
    #[case(json!(3500.5), Decimal::new(35005, 1))]
    #[case(json!("1200"), Decimal::new(1200, 0))]
    fn income_claim_reads_as_decimal(
        validator: JwtCredentialValidator,
        #[case] salary: Value,
        #[case] expected: Decimal,
    ) {
        let credential = token(&json!({ "salarioBase": salary }));
        assert_eq!(validator.declared_income(&credential).expect("income"), expected);
    }

    #[rstest]
    fn missing_income_is_reported(validator: JwtCredentialValidator) {
        let credential = token(&json!({ "objectId": "1" }));
        assert_eq!(
            validator.declared_income(&credential),
            Err(CredentialError::missing_claim("salarioBase"))
        );
    }

    #[rstest]
    #[case(json!({ "roles": "ROLE_USER, ROLE_ADMIN" }), &["ROLE_ADMIN", "ROLE_USER"][..])]
    #[case(json!({ "roles": "" }), &[][..])]
    #[case(json!({ "objectId": "1" }), &[][..])]
    fn roles_split_on_commas(
        validator: JwtCredentialValidator,
        #[case] claims: Value,
        #[case] expected: &[&str],
    ) {
        let roles = validator.roles(&token(&claims)).expect("roles");
        let expected: BTreeSet<String> = expected.iter().map(|role| (*role).to_owned()).collect();
        assert_eq!(roles, expected);
    }

    #[rstest]
    fn foreign_signature_is_rejected(validator: JwtCredentialValidator) {
        let credential = token_with(
            &json!({ "objectId": "1" }),
            b"another-secret-that-is-long-enough-for-hs256",
        );
        assert!(matches!(
            validator.subject(&credential),
            Err(CredentialError::InvalidCredential { .. })
        ));
    }

    #[rstest]
    fn expired_token_is_rejected(validator: JwtCredentialValidator) {
        let credential = token(&json!({ "objectId": "1", "exp": 1_000_000 }));
        assert!(matches!(
            validator.subject(&credential),
            Err(CredentialError::InvalidCredential { .. })
        ));
    }

    #[test]
    fn claim_names_are_configurable() {
        let validator = JwtCredentialValidator::new(
            SECRET,
            JwtClaimNames {
                subject: "uid".to_owned(),
                ..JwtClaimNames::default()
            },
        );
        let credential = token(&json!({ "uid": "99", "objectId": "1" }));
        assert_eq!(validator.subject(&credential).expect("subject"), "99");
    }
}
