use crate::error::Error as ApiError;
use crate::session::{current_actor, Actor};
use actix_session::SessionExt;
use actix_web::dev::{self, Payload, Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::{web::Data, Error, FromRequest, HttpMessage, HttpRequest};
use futures::future::{ready, LocalBoxFuture, Ready};
use sea_orm::DatabaseConnection;
use std::rc::Rc;

/// Client data stored for a single request cycle.
#[derive(Clone, Debug, Default)]
pub struct ClientCtxInner {
    /// Authenticated admin. None is an anonymous visitor.
    pub actor: Option<Actor>,
}

/// Client context passed to routes.
/// Wraps ClientCtxInner, which is set at the beginning of the request.
#[derive(Clone, Debug)]
pub struct ClientCtx(Data<ClientCtxInner>);

impl Default for ClientCtx {
    fn default() -> Self {
        Self(Data::new(ClientCtxInner::default()))
    }
}

impl ClientCtx {
    /// Returns either the admin's id or None.
    pub fn get_id(&self) -> Option<i32> {
        self.0.actor.as_ref().map(|a| a.id)
    }

    pub fn get_actor(&self) -> Option<&Actor> {
        self.0.actor.as_ref()
    }

    pub fn is_admin(&self) -> bool {
        self.0.actor.is_some()
    }

    /// Require an authenticated admin. Returns the actor or Unauthorized.
    pub fn require_admin(&self) -> Result<&Actor, ApiError> {
        self.0.actor.as_ref().ok_or(ApiError::Unauthorized)
    }
}

/// This implementation is what actually provides the `client: ClientCtx` in the parameters of route functions.
impl FromRequest for ClientCtx {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        // Without the middleware every request is anonymous.
        let ctx = match req.extensions().get::<Data<ClientCtxInner>>() {
            Some(inner) => Self(inner.clone()),
            None => Self::default(),
        };
        ready(Ok(ctx))
    }
}

impl<S: 'static, B> Transform<S, ServiceRequest> for ClientCtx
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = ClientCtxMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(ClientCtxMiddleware {
            service: Rc::new(service),
        }))
    }
}

/// Resolves the session cookie into a `ClientCtxInner` before the handler runs.
pub struct ClientCtxMiddleware<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for ClientCtxMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    dev::forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let svc = self.service.clone();

        Box::pin(async move {
            // If we do not have a database there is no session to resolve.
            if let Some(db) = req.app_data::<Data<DatabaseConnection>>() {
                let db = db.clone();
                let session = req.get_session();
                let actor = current_actor(&db, &session).await;

                req.extensions_mut()
                    .insert(Data::new(ClientCtxInner { actor }));
            } else {
                log::error!("ClientCtxMiddleware: DatabaseConnection is not registered");
            }

            svc.call(req).await
        })
    }
}
