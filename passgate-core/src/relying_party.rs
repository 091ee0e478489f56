//! Ceremony orchestration.
//!
//! `begin_*` draws a challenge, builds client options and binds the challenge
//! to the user in a [`SessionData`]. `finish_*` consumes that session: it is
//! invalidated whether the ceremony passes or fails, so a challenge can be
//! answered at most once.
//!
//! Signatures and attestation statements are not checked here. A successful
//! [`VerifiedResponse`] means the response is fresh, bound to this user and
//! session, and came from an allowed origin; it is the input to the
//! cryptographic verifier.

use std::sync::Arc;

use crate::challenge::Challenge;
use crate::client_data::{CeremonyType, ClientDataVerdict};
use crate::config::{RelyingPartyBuilder, RelyingPartyConfig};
use crate::entropy::{EntropySource, EntropySourceId};
use crate::error::{CeremonyError, Result, VerificationError};
use crate::options::{
    AuthenticatorSelection, CreationOptionsDraft, LoginOptions, PubKeyCredParam, PublicKeyCredentialCreationOptions,
    PublicKeyCredentialRequestOptions, RegistrationOptions, RelyingPartyEntity, RequestOptionsDraft, UserEntity,
    UserVerificationRequirement,
};
use crate::response::{
    parse_response, AuthenticatorFlags, CredentialResponse, ParsedCredentialAssertion, ParsedCredentialCreation,
    RawRequest,
};
use crate::session::SessionData;
use crate::user::User;

/// A response that passed every ceremony gate.
#[derive(Debug, Clone)]
pub struct VerifiedResponse<T> {
    pub response: T,
    /// User handle the session was bound to.
    pub user_id: Vec<u8>,
    pub client_data: ClientDataVerdict,
}

/// WebAuthn Relying Party.
pub struct RelyingParty {
    config: RelyingPartyConfig,
    entropy: Arc<dyn EntropySource>,
}

impl RelyingParty {
    pub fn builder<I, S>(rp_id: impl Into<String>, origins: I) -> RelyingPartyBuilder
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        RelyingPartyBuilder::new(rp_id, origins)
    }

    pub(crate) fn from_parts(config: RelyingPartyConfig, entropy: Arc<dyn EntropySource>) -> Self {
        if entropy.source_id() == EntropySourceId::Mock {
            tracing::warn!("Relying party is using mock entropy - challenges are predictable!");
        }
        Self { config, entropy }
    }

    pub fn config(&self) -> &RelyingPartyConfig {
        &self.config
    }

    pub fn entropy_source(&self) -> EntropySourceId {
        self.entropy.source_id()
    }

    /// Draw a fresh challenge of the configured length.
    pub fn create_challenge(&self) -> Result<Challenge> {
        Challenge::generate(self.entropy.as_ref(), self.config.challenge_len)
    }

    // ==================== Login ====================

    /// Start an authentication ceremony for `user`.
    ///
    /// The allow list defaults to the user's registered credentials; the
    /// returned session must be stored by the caller until `finish_login`.
    pub fn begin_login<U: User + ?Sized>(
        &self,
        user: &U,
        options: LoginOptions,
    ) -> Result<(PublicKeyCredentialRequestOptions, SessionData)> {
        let challenge = self.create_challenge()?;

        let mut draft = RequestOptionsDraft {
            timeout: self.config.timeout,
            rp_id: self.config.rp_id.clone(),
            allow_credentials: user.webauthn_credentials(),
            user_verification: self.config.user_verification,
        };
        options.apply(&mut draft);

        let allowed = draft.allow_credentials.iter().map(|c| c.id.clone()).collect();
        let session = SessionData::bind(challenge.clone(), user, allowed, draft.user_verification);

        tracing::debug!(
            ceremony = %CeremonyType::Assert,
            challenge_len = challenge.len(),
            challenge_fp = %challenge.fingerprint(),
            allowed_credentials = draft.allow_credentials.len(),
            "Login ceremony started"
        );

        Ok((draft.finish(challenge), session))
    }

    /// Complete an authentication ceremony.
    ///
    /// Consumes `session`. Any error leaves nothing usable behind; the
    /// caller must not retry with the same session.
    pub fn finish_login<U: User + ?Sized>(
        &self,
        user: &U,
        session: SessionData,
        request: &RawRequest<'_>,
    ) -> Result<VerifiedResponse<ParsedCredentialAssertion>> {
        let challenge_fp = session.challenge.fingerprint();
        let outcome = self.complete_login(user, &session, request);
        session.invalidate();

        match &outcome {
            Ok(verified) => tracing::info!(
                ceremony = %CeremonyType::Assert,
                challenge_fp = %challenge_fp,
                credential_id = %verified.response.id,
                token_binding = ?verified.client_data.token_binding,
                "Login ceremony verified"
            ),
            Err(e) => log_rejection(CeremonyType::Assert, &challenge_fp, e),
        }
        outcome
    }

    fn complete_login<U: User + ?Sized>(
        &self,
        user: &U,
        session: &SessionData,
        request: &RawRequest<'_>,
    ) -> Result<VerifiedResponse<ParsedCredentialAssertion>> {
        if !session.is_bound_to(user) {
            return Err(VerificationError::UserMismatch.into());
        }

        let CredentialResponse::Assertion(assertion) = parse_response(request, CeremonyType::Assert)? else {
            unreachable!("assertion ceremony always parses an assertion");
        };

        let verdict = assertion.client_data.verify(
            &session.challenge,
            CeremonyType::Assert,
            &self.config.client_data,
            &request.token_binding,
        )?;

        if !session.allowed_credential_ids.is_empty() && !session.allowed_credential_ids.contains(&assertion.id) {
            return Err(VerificationError::CredentialNotAllowed.into());
        }
        if let Some(handle) = &assertion.user_handle {
            if *handle != session.user_id {
                return Err(VerificationError::UserHandleMismatch.into());
            }
        }
        check_user_flags(assertion.authenticator_data.flags, session.user_verification)?;

        Ok(VerifiedResponse {
            response: assertion,
            user_id: session.user_id.clone(),
            client_data: verdict,
        })
    }

    // ==================== Registration ====================

    /// Start a registration ceremony for `user`.
    ///
    /// Credentials the user already owns go into the exclude list.
    pub fn begin_registration<U: User + ?Sized>(
        &self,
        user: &U,
        options: RegistrationOptions,
    ) -> Result<(PublicKeyCredentialCreationOptions, SessionData)> {
        let challenge = self.create_challenge()?;

        let mut draft = CreationOptionsDraft {
            rp: RelyingPartyEntity {
                id: self.config.rp_id.clone(),
                name: self.config.rp_name.clone(),
            },
            pub_key_cred_params: self.config.cred_algorithms.iter().copied().map(PubKeyCredParam::new).collect(),
            timeout: self.config.timeout,
            exclude_credentials: user.webauthn_credentials(),
            authenticator_selection: AuthenticatorSelection {
                user_verification: self.config.user_verification,
                ..AuthenticatorSelection::default()
            },
            attestation: self.config.attestation,
        };
        options.apply(&mut draft);

        let session = SessionData::bind(
            challenge.clone(),
            user,
            Vec::new(),
            draft.authenticator_selection.user_verification,
        );

        tracing::debug!(
            ceremony = %CeremonyType::Create,
            challenge_len = challenge.len(),
            challenge_fp = %challenge.fingerprint(),
            excluded_credentials = draft.exclude_credentials.len(),
            "Registration ceremony started"
        );

        let entity = UserEntity {
            id: session.user_id.clone(),
            name: user.webauthn_name().to_string(),
            display_name: user.webauthn_display_name().to_string(),
        };
        Ok((draft.finish(entity, challenge), session))
    }

    /// Complete a registration ceremony. Consumes `session`.
    pub fn finish_registration<U: User + ?Sized>(
        &self,
        user: &U,
        session: SessionData,
        request: &RawRequest<'_>,
    ) -> Result<VerifiedResponse<ParsedCredentialCreation>> {
        let challenge_fp = session.challenge.fingerprint();
        let outcome = self.complete_registration(user, &session, request);
        session.invalidate();

        match &outcome {
            Ok(verified) => tracing::info!(
                ceremony = %CeremonyType::Create,
                challenge_fp = %challenge_fp,
                credential_id = %verified.response.id,
                fmt = %verified.response.attestation_object.fmt,
                "Registration ceremony verified"
            ),
            Err(e) => log_rejection(CeremonyType::Create, &challenge_fp, e),
        }
        outcome
    }

    fn complete_registration<U: User + ?Sized>(
        &self,
        user: &U,
        session: &SessionData,
        request: &RawRequest<'_>,
    ) -> Result<VerifiedResponse<ParsedCredentialCreation>> {
        if !session.is_bound_to(user) {
            return Err(VerificationError::UserMismatch.into());
        }

        let CredentialResponse::Registration(creation) = parse_response(request, CeremonyType::Create)? else {
            unreachable!("registration ceremony always parses a registration");
        };

        let verdict = creation.client_data.verify(
            &session.challenge,
            CeremonyType::Create,
            &self.config.client_data,
            &request.token_binding,
        )?;

        let auth_data = &creation.attestation_object.auth_data;
        let attested_id = auth_data.attested_credential.as_ref().map(|a| &a.credential_id);
        if attested_id != Some(&creation.id) {
            return Err(VerificationError::CredentialIdMismatch.into());
        }
        check_user_flags(auth_data.flags, session.user_verification)?;

        Ok(VerifiedResponse {
            response: creation,
            user_id: session.user_id.clone(),
            client_data: verdict,
        })
    }
}

impl std::fmt::Debug for RelyingParty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RelyingParty")
            .field("config", &self.config)
            .field("entropy", &self.entropy.source_id())
            .finish()
    }
}

fn check_user_flags(
    flags: AuthenticatorFlags,
    requirement: UserVerificationRequirement,
) -> std::result::Result<(), VerificationError> {
    if !flags.user_present() {
        return Err(VerificationError::UserNotPresent);
    }
    if requirement == UserVerificationRequirement::Required && !flags.user_verified() {
        return Err(VerificationError::UserVerificationMissing);
    }
    Ok(())
}

fn log_rejection(ceremony: CeremonyType, challenge_fp: &str, error: &CeremonyError) {
    match error {
        CeremonyError::EntropySourceFailure(_) | CeremonyError::Config(_) => tracing::error!(
            ceremony = %ceremony,
            challenge_fp = %challenge_fp,
            code = error.code(),
            error = %error,
            "Ceremony failed"
        ),
        _ => tracing::warn!(
            ceremony = %ceremony,
            challenge_fp = %challenge_fp,
            code = error.code(),
            error = %error,
            "Ceremony rejected"
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoding;
    use crate::entropy::MockEntropy;
    use crate::error::ParseError;
    use crate::user::{CredentialDescriptor, CredentialId};
    use serde_json::json;
    use std::time::Duration;

    struct TestUser {
        id: Vec<u8>,
        credentials: Vec<CredentialDescriptor>,
    }

    impl User for TestUser {
        fn webauthn_id(&self) -> &[u8] {
            &self.id
        }

        fn webauthn_name(&self) -> &str {
            "test"
        }

        fn webauthn_credentials(&self) -> Vec<CredentialDescriptor> {
            self.credentials.clone()
        }
    }

    fn alice() -> TestUser {
        TestUser {
            id: b"alice".to_vec(),
            credentials: vec![CredentialDescriptor::new(vec![1, 2, 3])],
        }
    }

    fn relying_party() -> RelyingParty {
        RelyingParty::builder("example.com", ["https://example.com"])
            .entropy_source(Arc::new(MockEntropy::default_test()))
            .build()
            .unwrap()
    }

    fn assertion(challenge: &str, flags: u8, user_handle: Option<&[u8]>) -> String {
        let client_data = json!({
            "type": "webauthn.get",
            "challenge": challenge,
            "origin": "https://example.com",
        });
        let mut auth_data = vec![0u8; 32];
        auth_data.push(flags);
        auth_data.extend_from_slice(&1u32.to_be_bytes());

        json!({
            "id": "AQID",
            "rawId": "AQID",
            "type": "public-key",
            "response": {
                "clientDataJSON": encoding::encode(client_data.to_string().as_bytes()),
                "authenticatorData": encoding::encode(&auth_data),
                "signature": "c2ln",
                "userHandle": user_handle.map(encoding::encode),
            }
        })
        .to_string()
    }

    #[test]
    fn test_begin_login_session_matches_options() {
        let rp = relying_party();
        let (options, session) = rp.begin_login(&alice(), LoginOptions::new()).unwrap();

        assert_eq!(options.challenge.as_bytes(), session.challenge.as_bytes());
        assert_eq!(options.challenge.len(), 32);
        assert_eq!(options.rp_id, "example.com");
        assert_eq!(options.timeout, 300_000);
        assert_eq!(options.allow_credentials.len(), 1);
        assert_eq!(session.user_id, b"alice");
        assert_eq!(session.allowed_credential_ids, vec![CredentialId::from(vec![1, 2, 3])]);
    }

    #[test]
    fn test_begin_login_modifiers_cannot_reach_challenge() {
        let rp = relying_party();
        let (options, session) = rp
            .begin_login(
                &alice(),
                LoginOptions::new()
                    .timeout(Duration::from_secs(30))
                    .user_verification(UserVerificationRequirement::Required)
                    .with_override(|d| d.allow_credentials.clear()),
            )
            .unwrap();

        assert_eq!(options.timeout, 30_000);
        assert!(options.allow_credentials.is_empty());
        assert!(session.allowed_credential_ids.is_empty());
        assert_eq!(session.user_verification, UserVerificationRequirement::Required);
        assert!(session.challenge.matches(options.challenge.as_bytes()));
    }

    #[test]
    fn test_finish_login_success() {
        let rp = relying_party();
        let user = alice();
        let (options, session) = rp.begin_login(&user, LoginOptions::new()).unwrap();

        let body = assertion(&options.challenge.to_base64url(), 0x01, Some(b"alice"));
        let verified = rp.finish_login(&user, session, &RawRequest::new(body.as_bytes())).unwrap();

        assert_eq!(verified.user_id, b"alice");
        assert_eq!(verified.response.authenticator_data.sign_count, 1);
    }

    #[test]
    fn test_user_mismatch_before_parsing() {
        let rp = relying_party();
        let (_, session) = rp.begin_login(&alice(), LoginOptions::new()).unwrap();
        let mallory = TestUser {
            id: b"mallory".to_vec(),
            credentials: Vec::new(),
        };

        let err = rp.finish_login(&mallory, session, &RawRequest::new(b"")).unwrap_err();
        assert!(matches!(
            err,
            CeremonyError::Verification(VerificationError::UserMismatch)
        ));
    }

    #[test]
    fn test_parse_failure_is_bad_request() {
        let rp = relying_party();
        let user = alice();
        let (_, session) = rp.begin_login(&user, LoginOptions::new()).unwrap();

        let err = rp.finish_login(&user, session, &RawRequest::new(b"")).unwrap_err();
        assert!(matches!(err, CeremonyError::BadRequest(ParseError::EmptyBody)));
    }

    #[test]
    fn test_credential_outside_allow_list() {
        let rp = relying_party();
        let user = TestUser {
            id: b"alice".to_vec(),
            credentials: vec![CredentialDescriptor::new(vec![9, 9])],
        };
        let (options, session) = rp.begin_login(&user, LoginOptions::new()).unwrap();

        let body = assertion(&options.challenge.to_base64url(), 0x01, None);
        let err = rp.finish_login(&user, session, &RawRequest::new(body.as_bytes())).unwrap_err();
        assert_eq!(err.code(), "CREDENTIAL_NOT_ALLOWED");
    }

    #[test]
    fn test_user_handle_must_match_session() {
        let rp = relying_party();
        let user = alice();
        let (options, session) = rp.begin_login(&user, LoginOptions::new()).unwrap();

        let body = assertion(&options.challenge.to_base64url(), 0x01, Some(b"bob"));
        let err = rp.finish_login(&user, session, &RawRequest::new(body.as_bytes())).unwrap_err();
        assert_eq!(err.code(), "USER_HANDLE_MISMATCH");
    }

    #[test]
    fn test_user_presence_and_verification_flags() {
        let rp = relying_party();
        let user = alice();

        let (options, session) = rp.begin_login(&user, LoginOptions::new()).unwrap();
        let body = assertion(&options.challenge.to_base64url(), 0x00, None);
        let err = rp.finish_login(&user, session, &RawRequest::new(body.as_bytes())).unwrap_err();
        assert_eq!(err.code(), "USER_NOT_PRESENT");

        let (options, session) = rp
            .begin_login(
                &user,
                LoginOptions::new().user_verification(UserVerificationRequirement::Required),
            )
            .unwrap();
        let body = assertion(&options.challenge.to_base64url(), 0x01, None);
        let err = rp.finish_login(&user, session, &RawRequest::new(body.as_bytes())).unwrap_err();
        assert_eq!(err.code(), "USER_VERIFICATION_MISSING");
    }

    #[test]
    fn test_begin_registration_defaults() {
        let rp = relying_party();
        let (options, session) = rp.begin_registration(&alice(), RegistrationOptions::new()).unwrap();

        assert_eq!(options.rp.id, "example.com");
        assert_eq!(options.rp.name, "Passgate");
        assert_eq!(options.user.id, b"alice");
        assert_eq!(
            options.pub_key_cred_params.iter().map(|p| p.alg).collect::<Vec<_>>(),
            vec![-7, -8, -257]
        );
        assert_eq!(options.exclude_credentials.len(), 1);
        assert!(session.allowed_credential_ids.is_empty());
        assert!(session.challenge.matches(options.challenge.as_bytes()));
    }

    #[test]
    fn test_registration_overrides_keep_session_user_handle() {
        let rp = relying_party();
        let (options, session) = rp
            .begin_registration(
                &alice(),
                RegistrationOptions::new().with_override(|d| {
                    d.rp.name = "Renamed".into();
                    d.exclude_credentials.clear();
                }),
            )
            .unwrap();

        assert_eq!(options.rp.name, "Renamed");
        assert!(options.exclude_credentials.is_empty());
        assert_eq!(options.user.id, session.user_id);
        assert_eq!(options.user.id, b"alice");
    }
}
