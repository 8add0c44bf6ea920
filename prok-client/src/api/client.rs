use async_trait::async_trait;
use reqwest::header::ACCEPT;
use reqwest::{multipart, Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;

use super::{ApiError, ApiResult, GetPostsParams};
use crate::compose::{MediaFile, PostDraft, ProfileImage};
use crate::feed::PostsApi;
use crate::session::Session;
use prok_types::*;

pub const DEFAULT_SERVER_URL: &str = "http://localhost:5000";

/// Page size used when the caller does not pick one.
pub const DEFAULT_PER_PAGE: u32 = 10;

/// API client for communicating with the Prok backend
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    session: Session,
}

impl ApiClient {
    /// Create a new API client with an empty session
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_session(base_url, Session::new())
    }

    /// Create a client bound to an existing session
    pub fn with_session(base_url: impl Into<String>, session: Session) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            client: Client::new(),
            base_url,
            session,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Attach the bearer token, failing early when there is none.
    fn authorize(&self, req: RequestBuilder) -> ApiResult<RequestBuilder> {
        let token = self.session.token().ok_or(ApiError::MissingToken)?;
        Ok(req.bearer_auth(token))
    }

    async fn send<T: DeserializeOwned>(&self, req: RequestBuilder) -> ApiResult<T> {
        let response = req.header(ACCEPT, "application/json").send().await?;
        self.handle_response(response, false).await
    }

    async fn send_authed<T: DeserializeOwned>(&self, req: RequestBuilder) -> ApiResult<T> {
        let req = self.authorize(req)?;
        let response = req.header(ACCEPT, "application/json").send().await?;
        self.handle_response(response, true).await
    }

    /// Helper to handle API responses
    async fn handle_response<T: DeserializeOwned>(
        &self,
        response: Response,
        authed: bool,
    ) -> ApiResult<T> {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        if status.is_success() {
            return serde_json::from_str(&body).map_err(|e| {
                log::warn!(target: "api_calls", "Undecodable {} response: {}", status.as_u16(), e);
                ApiError::Decode(e.to_string())
            });
        }

        let message = error_message(status, &body);
        log_api_call!("Request failed with {}: {}", status.as_u16(), message);

        if authed && status == StatusCode::UNAUTHORIZED {
            log::warn!("Server rejected session token, clearing session");
            self.session.invalidate();
        }

        Err(ApiError::from_status(status.as_u16(), message))
    }

    /// Check that the backend is reachable
    pub async fn health(&self) -> ApiResult<bool> {
        let url = self.url("/api/health");
        log_api_call!("GET {}", url);
        let response: HealthResponse = self.send(self.client.get(&url)).await?;
        Ok(response.status == "ok")
    }

    // Authentication endpoints

    /// Login with username or email and password; the returned token becomes the session
    pub async fn login(&self, username_or_email: &str, password: &str) -> ApiResult<AuthResponse> {
        let url = self.url("/api/login");
        log_api_call!("POST {} for {}", url, username_or_email);
        let request = LoginRequest {
            username_or_email: username_or_email.to_string(),
            password: password.to_string(),
        };
        let response: AuthResponse = self.send(self.client.post(&url).json(&request)).await?;
        self.session
            .establish(response.access_token.clone(), Some(response.user.clone()));
        Ok(response)
    }

    /// Create an account; the returned token becomes the session
    pub async fn signup(&self, request: &SignupRequest) -> ApiResult<AuthResponse> {
        let url = self.url("/api/signup");
        log_api_call!("POST {} for {}", url, request.username);
        let response: AuthResponse = self.send(self.client.post(&url).json(request)).await?;
        self.session
            .establish(response.access_token.clone(), Some(response.user.clone()));
        Ok(response)
    }

    /// Fetch the user behind the current token
    pub async fn me(&self) -> ApiResult<User> {
        let url = self.url("/api/me");
        log_api_call!("GET {}", url);
        let response: MeResponse = self.send_authed(self.client.get(&url)).await?;
        self.session.set_user(response.user.clone());
        Ok(response.user)
    }

    /// Logout. The local session is cleared whether or not the server call succeeds.
    pub async fn logout(&self) -> ApiResult<()> {
        let url = self.url("/api/logout");
        log_api_call!("POST {}", url);
        let result: ApiResult<MessageResponse> = self.send_authed(self.client.post(&url)).await;
        self.session.clear();
        result.map(|_| ())
    }

    // Post endpoints

    /// Get one page of posts
    pub async fn get_posts(&self, params: &GetPostsParams) -> ApiResult<PostPage> {
        let url = self.url("/api/posts");
        let query = params.to_query();
        log_api_call!("GET {} {:?}", url, query);
        let envelope: PostsEnvelope = self
            .send_authed(self.client.get(&url).query(&query))
            .await?;
        Ok(envelope.into_page(params.per_page.unwrap_or(DEFAULT_PER_PAGE)))
    }

    /// Create a new post as a multipart form. Callers are expected to have
    /// validated the draft; see [`crate::compose::submit_post`].
    pub async fn create_post(&self, draft: &PostDraft) -> ApiResult<Post> {
        let url = self.url("/api/posts");
        log_api_call!("POST {} (media: {})", url, draft.media.is_some());

        let mut form = multipart::Form::new()
            .text("content", draft.content.trim().to_string())
            .text("rich_content", draft.rich_content.clone().unwrap_or_default())
            .text("tags", draft.tags.join(","))
            .text("visibility", draft.visibility.as_str());
        if let Some(category) = &draft.category {
            form = form.text("category", category.clone());
        }
        if let Some(media) = &draft.media {
            form = form.part("media", file_part(media)?);
        }

        let response: CreatePostResponse = self
            .send_authed(self.client.post(&url).multipart(form))
            .await?;
        Ok(response.post)
    }

    /// Like a post; the response carries the authoritative counter
    pub async fn like_post(&self, post_id: i64) -> ApiResult<LikeResponse> {
        let url = self.url(&format!("/api/posts/{}/like", post_id));
        log_api_call!("POST {}", url);
        self.send_authed(self.client.post(&url)).await
    }

    /// Get available post categories
    pub async fn get_categories(&self) -> ApiResult<Vec<String>> {
        let url = self.url("/api/posts/categories");
        log_api_call!("GET {}", url);
        let list: NameList = self.send_authed(self.client.get(&url)).await?;
        Ok(list.into_names())
    }

    /// Get the most used tags
    pub async fn get_popular_tags(&self) -> ApiResult<Vec<String>> {
        let url = self.url("/api/posts/popular-tags");
        log_api_call!("GET {}", url);
        let list: NameList = self.send_authed(self.client.get(&url)).await?;
        Ok(list.into_names())
    }

    // Profile endpoints

    /// Get the current user's profile
    pub async fn get_profile(&self) -> ApiResult<Profile> {
        let url = self.url("/api/profile");
        log_api_call!("GET {}", url);
        let response: ProfileResponse = self.send_authed(self.client.get(&url)).await?;
        Ok(response.profile)
    }

    /// Get another user's public profile
    pub async fn get_user_profile(&self, user_id: i64) -> ApiResult<Profile> {
        let url = self.url(&format!("/api/profile/{}", user_id));
        log_api_call!("GET {}", url);
        let response: ProfileResponse = self.send_authed(self.client.get(&url)).await?;
        Ok(response.profile)
    }

    /// Update profile fields
    pub async fn update_profile(&self, request: &UpdateProfileRequest) -> ApiResult<Profile> {
        let url = self.url("/api/profile");
        log_api_call!("PUT {}", url);
        let response: ProfileResponse = self
            .send_authed(self.client.put(&url).json(request))
            .await?;
        Ok(response.profile)
    }

    /// Upload a new profile picture, returning its URL
    pub async fn upload_profile_image(&self, image: &ProfileImage) -> ApiResult<String> {
        let url = self.url("/api/profile/image");
        log_api_call!("POST {} ({} bytes)", url, image.file.size());
        let form = multipart::Form::new().part("image", file_part(&image.file)?);
        let response: ProfileImageResponse = self
            .send_authed(self.client.post(&url).multipart(form))
            .await?;
        Ok(response.image_url)
    }
}

impl Default for ApiClient {
    fn default() -> Self {
        let base_url =
            std::env::var("PROK_SERVER_URL").unwrap_or_else(|_| DEFAULT_SERVER_URL.to_string());
        Self::new(base_url)
    }
}

#[async_trait]
impl PostsApi for ApiClient {
    async fn fetch_posts(&self, params: &GetPostsParams) -> ApiResult<PostPage> {
        self.get_posts(params).await
    }

    async fn like_post(&self, post_id: i64) -> ApiResult<LikeResponse> {
        ApiClient::like_post(self, post_id).await
    }
}

fn file_part(file: &MediaFile) -> ApiResult<multipart::Part> {
    let part = multipart::Part::bytes(file.bytes.clone())
        .file_name(file.file_name.clone())
        .mime_str(&file.content_type)?;
    Ok(part)
}

/// Human-readable message for a failed response: the JSON `error` field when
/// present, otherwise the status line.
fn error_message(status: StatusCode, body: &str) -> String {
    if let Ok(err) = serde_json::from_str::<ErrorResponse>(body) {
        if !err.error.trim().is_empty() {
            return err.error;
        }
    }

    // Proxies answer with HTML pages (e.g. nginx 502s)
    if body.contains("<html") || body.contains("<!DOCTYPE") {
        return format!(
            "Server returned {} error. Please check the server URL.",
            status.as_u16()
        );
    }

    format!(
        "HTTP {}: {}",
        status.as_u16(),
        status.canonical_reason().unwrap_or("Unknown Status")
    )
}
