use async_trait::async_trait;
use modkit::TracedClient;
use reqwest::{header, multipart, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};
use url::Url;

use crate::config::Endpoints;
use crate::contract::client::{AccountApi, AuthApi};
use crate::contract::error::ProfileError;
use crate::contract::model::{
    BookingRecord, Credential, PasswordChange, ProfileUpdate, Registration, Session, SignedIn,
};
use crate::infra::http::dto::{
    AuthResponse, BookingsResponse, LoginReq, RegisterReq, UpdatePasswordReq, UserEnvelope,
};
use crate::infra::http::mapper::{
    auth_to_signed_in, booking_to_record, error_from_response, transport_error, user_to_session,
};

/// Talks to the auth/profile service over JSON + multipart.
#[derive(Clone)]
pub struct HttpProfileClient {
    client: TracedClient,
    base: Url,
    endpoints: Endpoints,
}

impl HttpProfileClient {
    pub fn new(client: TracedClient, base: Url, endpoints: Endpoints) -> Self {
        let mut base = base;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        Self {
            client,
            base,
            endpoints,
        }
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    fn url(&self, path: &str) -> Result<Url, ProfileError> {
        self.base
            .join(path.trim_start_matches('/'))
            .map_err(|e| ProfileError::transport(format!("bad endpoint '{path}': {e}")))
    }

    fn request(
        &self,
        method: Method,
        path: &str,
        credential: Option<&Credential>,
    ) -> Result<RequestBuilder, ProfileError> {
        let url = self.url(path)?;
        let mut builder = self
            .client
            .request(method, url.as_str())
            .header(header::ACCEPT, "application/json");
        if let Some(c) = credential {
            builder = builder.bearer_auth(c.bearer());
        }
        Ok(builder)
    }

    /// Send and map non-2xx answers to contract errors.
    async fn send(&self, builder: RequestBuilder) -> Result<Response, ProfileError> {
        let resp = self.client.send(builder).await.map_err(transport_error)?;
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let body = resp.bytes().await.map_err(transport_error)?;
        debug!(status = status.as_u16(), "service rejected request");
        Err(error_from_response(status, &body))
    }

    async fn send_json<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, ProfileError> {
        let resp = self.send(builder).await?;
        let body = resp.bytes().await.map_err(transport_error)?;
        serde_json::from_slice(&body)
            .map_err(|e| ProfileError::transport(format!("unexpected response body: {e}")))
    }
}

#[async_trait]
impl AuthApi for HttpProfileClient {
    #[instrument(name = "profile_view.http.login", skip_all)]
    async fn login(&self, email: &str, password: &str) -> Result<SignedIn, ProfileError> {
        let builder = self
            .request(Method::POST, &self.endpoints.login, None)?
            .json(&LoginReq { email, password });
        let resp: AuthResponse = self.send_json(builder).await?;
        Ok(auth_to_signed_in(resp))
    }

    #[instrument(name = "profile_view.http.register", skip_all)]
    async fn register(&self, registration: Registration) -> Result<SignedIn, ProfileError> {
        let builder = self
            .request(Method::POST, &self.endpoints.register, None)?
            .json(&RegisterReq {
                name: &registration.name,
                email: &registration.email,
                password: &registration.password,
                password_confirmation: &registration.password_confirmation,
            });
        let resp: AuthResponse = self.send_json(builder).await?;
        Ok(auth_to_signed_in(resp))
    }

    #[instrument(name = "profile_view.http.logout", skip_all)]
    async fn logout(&self, credential: &Credential) -> Result<(), ProfileError> {
        let builder = self.request(Method::POST, &self.endpoints.logout, Some(credential))?;
        self.send(builder).await.map(|_| ())
    }

    #[instrument(name = "profile_view.http.current_user", skip_all)]
    async fn current_user(&self, credential: &Credential) -> Result<Session, ProfileError> {
        let builder = self.request(Method::GET, &self.endpoints.current_user, Some(credential))?;
        let user: UserEnvelope = self.send_json(builder).await?;
        Ok(user_to_session(user.into_user()))
    }

    #[instrument(name = "profile_view.http.update_profile", skip_all, fields(with_picture = update.picture.is_some()))]
    async fn update_profile(
        &self,
        credential: &Credential,
        update: ProfileUpdate,
    ) -> Result<Session, ProfileError> {
        let mut form = multipart::Form::new()
            .text("name", update.name)
            .text("email", update.email);
        if let Some(file) = update.picture {
            let part = multipart::Part::bytes(file.bytes.to_vec())
                .file_name(file.file_name)
                .mime_str(&file.content_type)
                .map_err(|e| ProfileError::UnsupportedFile {
                    content_type: format!("{} ({e})", file.content_type),
                })?;
            form = form.part("profile_picture", part);
        }

        let builder = self
            .request(Method::POST, &self.endpoints.update_profile, Some(credential))?
            .multipart(form);
        let user: UserEnvelope = self.send_json(builder).await?;
        Ok(user_to_session(user.into_user()))
    }
}

#[async_trait]
impl AccountApi for HttpProfileClient {
    #[instrument(name = "profile_view.http.update_password", skip_all)]
    async fn update_password(
        &self,
        credential: &Credential,
        change: PasswordChange,
    ) -> Result<(), ProfileError> {
        let builder = self
            .request(Method::POST, &self.endpoints.update_password, Some(credential))?
            .json(&UpdatePasswordReq {
                current_password: &change.current_password,
                password: &change.password,
                password_confirmation: &change.password_confirmation,
            });
        self.send(builder).await.map(|_| ())
    }

    #[instrument(name = "profile_view.http.list_bookings", skip_all)]
    async fn list_bookings(
        &self,
        credential: &Credential,
    ) -> Result<Vec<BookingRecord>, ProfileError> {
        let builder = self.request(Method::GET, &self.endpoints.bookings, Some(credential))?;
        let resp: BookingsResponse = self.send_json(builder).await?;
        Ok(resp.bookings.into_iter().map(booking_to_record).collect())
    }
}
