use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::database::store::UserStore;
use crate::dto::api_dto::{Request, Response, VERSION};
use crate::error::{Error, Result};
use crate::middleware::method_policy::MethodPolicy;
use crate::models::user::User;
use crate::services::credential_cache::CredentialCache;
use crate::services::event_service::EventNotifier;

/// Routes JSON commands to the user store, with an apikey-indexed cache in
/// front of apikey lookups.
#[derive(Clone)]
pub struct ApiService {
    store: Arc<dyn UserStore>,
    cache: CredentialCache,
    policy: MethodPolicy,
    events: EventNotifier,
}

impl ApiService {
    pub fn new(store: Arc<dyn UserStore>, cache: CredentialCache, policy: MethodPolicy) -> Self {
        Self {
            store,
            cache,
            policy,
            events: EventNotifier::new(),
        }
    }

    pub fn is_public_method(&self, method: &str) -> bool {
        self.policy.is_public(method)
    }

    pub fn cache(&self) -> &CredentialCache {
        &self.cache
    }

    pub fn events(&self) -> &EventNotifier {
        &self.events
    }

    /// Parses and dispatches a raw JSON request. A parse failure yields an
    /// error response with no id or version.
    pub async fn handle_json(&self, data: &str) -> (Response, Result<()>) {
        match Request::parse(data) {
            Ok(mut request) => self.handle(&mut request).await,
            Err(err) => {
                warn!(error = %err, "unparseable request");
                (Response::from_error(&err), Err(err))
            }
        }
    }

    /// Dispatches one request. The response always carries the request id
    /// and version; on failure its status is `error` and the same error is
    /// returned alongside it. An empty request version is filled in on the
    /// request itself as well as on the response.
    pub async fn handle(&self, request: &mut Request) -> (Response, Result<()>) {
        debug!(id = %request.id, method = %request.method, "dispatching request");

        if request.version.is_empty() {
            request.version = VERSION.to_string();
        }

        let mut response = Response {
            id: request.id.clone(),
            version: request.version.clone(),
            ..Response::default()
        };

        let result = self.dispatch(request, &mut response).await;
        if let Err(err) = &result {
            warn!(id = %request.id, method = %request.method, error = %err, "request failed");
            response.set_error(err);
        }
        (response, result)
    }

    async fn dispatch(&self, request: &Request, response: &mut Response) -> Result<()> {
        let params = &request.params;
        match request.method.as_str() {
            "get_database_version" => {
                response.message = Some(self.store.get_version().await?);
            }
            "ping" => {
                response.message = Some("pong".to_string());
            }
            "create_user" => {
                let username = params.username().ok_or(Error::MissingParameters)?;
                info!(username, "creating user");
                let user = self
                    .create_user(
                        params.email().unwrap_or_default(),
                        username,
                        params.password().unwrap_or_default(),
                    )
                    .await?;
                response.data.user = Some(user);
            }
            "get_users" => {
                response.data.users = Some(self.store.get_users().await?);
            }
            "get_user" => {
                let user = self.fetch_user(request).await?;
                response.data.user = Some(user);
            }
            "delete_user" => {
                let mut user = self.fetch_user(request).await?;
                let apikey = user.apikey.clone();
                self.invalidating(&apikey, user.delete(self.store.as_ref()))
                    .await?;
            }
            "activate_user" => {
                let mut user = self.fetch_user(request).await?;
                let apikey = user.apikey.clone();
                self.invalidating(&apikey, user.activate(self.store.as_ref()))
                    .await?;
            }
            "deactivate_user" => {
                let mut user = self.fetch_user(request).await?;
                let apikey = user.apikey.clone();
                self.invalidating(&apikey, user.deactivate(self.store.as_ref()))
                    .await?;
            }
            "set_password" => {
                // an absent password would clear the hash through a public method
                let password = params.password().ok_or(Error::MissingParameters)?;
                let mut user = self.fetch_user(request).await?;
                let apikey = user.apikey.clone();
                self.invalidating(&apikey, user.set_password(password, self.store.as_ref()))
                    .await?;
            }
            _ => return Err(Error::MethodNotFound),
        }
        Ok(())
    }

    /// Drops the cache entry for `apikey` around a store mutation, so the
    /// next apikey lookup goes to the store once the mutation has returned.
    async fn invalidating<F>(&self, apikey: &str, mutation: F) -> Result<()>
    where
        F: std::future::Future<Output = Result<()>>,
    {
        self.cache.delete(apikey);
        let result = mutation.await;
        // a lookup that read the store before the commit may have cached it
        self.cache.delete(apikey);
        result
    }

    /// Create-then-set-password is two store writes with no compensation: if
    /// the second fails the account exists with no password.
    async fn create_user(&self, email: &str, username: &str, password: &str) -> Result<User> {
        let mut user = self.store.create_user(email, username).await?;
        user.set_password(password, self.store.as_ref()).await?;
        Ok(user)
    }

    /// apikey takes precedence over username.
    async fn fetch_user(&self, request: &Request) -> Result<User> {
        let params = &request.params;
        if let Some(apikey) = params.apikey() {
            self.get_user_by_apikey(apikey).await
        } else if let Some(username) = params.username() {
            self.store.get_user_by_username(username).await
        } else {
            Err(Error::MissingParameters)
        }
    }

    async fn get_user_by_apikey(&self, apikey: &str) -> Result<User> {
        if let Some(user) = self.cache.get(apikey) {
            debug!("credential cache hit");
            return Ok(user);
        }

        let generation = self.cache.generation(apikey);
        let user = self.store.get_user_by_apikey(apikey).await?;
        self.cache.insert_if_current(apikey, user.clone(), generation);
        Ok(user)
    }
}
