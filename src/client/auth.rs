use super::{ApiClient, ClientError};
use crate::{
    auth::{
        AuthResponse, ForgotPasswordRequest, LoginRequest, MessageResponse, RegisterRequest,
        ResetPasswordRequest, VerifyOtpRequest, VerifyOtpResponse,
    },
    users::dto::{PublicUser, UserEnvelope},
};

impl ApiClient {
    pub async fn login(&self, email: &str, password: &str) -> Result<AuthResponse, ClientError> {
        let body = LoginRequest {
            email: email.to_owned(),
            password: password.to_owned(),
        };
        self.post("/auth/login", &body).await
    }

    pub async fn register(
        &self,
        email: &str,
        password: &str,
        name: &str,
    ) -> Result<AuthResponse, ClientError> {
        let body = RegisterRequest {
            email: email.to_owned(),
            password: password.to_owned(),
            name: name.to_owned(),
        };
        self.post("/auth/register", &body).await
    }

    pub async fn logout(&self) -> Result<MessageResponse, ClientError> {
        self.post_empty("/auth/logout").await
    }

    pub async fn refresh(&self) -> Result<MessageResponse, ClientError> {
        self.post_empty("/auth/refresh").await
    }

    pub async fn current_user(&self) -> Result<PublicUser, ClientError> {
        let env: UserEnvelope = self.get("/auth/me").await?;
        Ok(env.user)
    }

    pub async fn forgot_password(&self, email: &str) -> Result<MessageResponse, ClientError> {
        let body = ForgotPasswordRequest {
            email: email.to_owned(),
        };
        self.post("/auth/forgot-password", &body).await
    }

    pub async fn verify_otp(&self, email: &str, otp: &str) -> Result<VerifyOtpResponse, ClientError> {
        let body = VerifyOtpRequest {
            email: email.to_owned(),
            otp: otp.to_owned(),
        };
        self.post("/auth/verify-otp", &body).await
    }

    pub async fn reset_password(
        &self,
        email: &str,
        reset_token: &str,
        new_password: &str,
    ) -> Result<MessageResponse, ClientError> {
        let body = ResetPasswordRequest {
            email: email.to_owned(),
            reset_token: reset_token.to_owned(),
            new_password: new_password.to_owned(),
        };
        self.post("/auth/reset-password", &body).await
    }
}
