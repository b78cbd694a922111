use super::model::{CurrentUser, Registered, Response};
use super::service::AuthService;
use crate::{
    constants::{OK_RESPONSE, SESSION_COOKIE, no_content_clearing_cookie, ok_with_cookie},
    error::CustomError,
    req::Request,
    utils::{des_from_str, ser_to_str},
};

pub struct AuthController {
    service: AuthService,
}

impl AuthController {
    pub fn new(service: AuthService) -> Self {
        AuthController { service }
    }

    pub async fn login(&self, request: &Request) -> (String, String) {
        let result = async {
            let req_user = des_from_str(&request.body)?;
            let token = self.service.login(&req_user, &request.headers).await?;
            let body = ser_to_str(&Response {
                token: token.clone(),
            })
            .map_err(|e| CustomError::Internal(e.to_string()))?;
            let cookie = format!(
                "{}={}; HttpOnly; Path=/; SameSite=Lax",
                SESSION_COOKIE, token
            );
            Ok::<_, CustomError>((ok_with_cookie(&cookie), body))
        }
        .await;
        result.unwrap_or_else(CustomError::into_response)
    }

    pub async fn register(&self, request: &Request) -> (String, String) {
        let result = async {
            let req_user: super::model::RegisterRequest = des_from_str(&request.body)?;
            let id = self.service.register(&req_user).await?;
            let body = ser_to_str(&Registered {
                id,
                username: req_user.username,
            })
            .map_err(|e| CustomError::Internal(e.to_string()))?;
            Ok::<_, CustomError>((OK_RESPONSE.to_string(), body))
        }
        .await;
        result.unwrap_or_else(CustomError::into_response)
    }

    pub async fn logout(&self, request: &Request) -> (String, String) {
        self.service.logout(&request.headers).await;
        (no_content_clearing_cookie(), "".to_string())
    }

    pub async fn authenticate(&self, request: &Request) -> Result<CurrentUser, CustomError> {
        self.service.authenticate(&request.headers).await
    }
}
