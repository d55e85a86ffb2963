//! Viewer resolvers: login, logout, and wallet onboarding.

use std::sync::Arc;

use async_graphql::{Context, ErrorExtensions, ID, InputObject, Object, Result};

use crate::domain::UserId;

use super::{GraphQlData, RequestSession};

/// The identity the current request acts as.
pub struct Viewer(crate::domain::Viewer);

#[Object]
impl Viewer {
    async fn id(&self) -> Option<ID> {
        self.0.id.as_ref().map(|id| ID::from(id.as_str()))
    }

    async fn token(&self) -> Option<&str> {
        self.0.token.as_deref()
    }

    async fn avatar(&self) -> Option<&str> {
        self.0.avatar.as_deref()
    }

    /// Present and true once the viewer has completed payment onboarding.
    async fn has_wallet(&self) -> Option<bool> {
        self.0.wallet_id.is_some().then_some(true)
    }

    /// Marks that the server processed the request, even for an anonymous
    /// viewer.
    async fn did_request(&self) -> bool {
        self.0.did_request
    }
}

#[derive(InputObject)]
struct LogInInput {
    /// Authorization code from the identity provider; absent for a
    /// cookie-based re-login.
    code: Option<String>,
}

#[derive(InputObject)]
struct ConnectWalletInput {
    /// OAuth code from the payment gateway's onboarding flow.
    code: String,
}

/// Viewer query root.
#[derive(Default)]
pub struct ViewerQuery;

#[Object]
impl ViewerQuery {
    /// URL clients are redirected to for identity-provider login.
    async fn auth_url(&self, ctx: &Context<'_>) -> Result<String> {
        let data = ctx.data::<GraphQlData>()?;
        Ok(data.viewer_service.auth_url())
    }
}

/// Viewer mutation root.
#[derive(Default)]
pub struct ViewerMutation;

#[Object]
impl ViewerMutation {
    /// Log in with a provider code, or re-login from the session cookie.
    async fn log_in(&self, ctx: &Context<'_>, input: Option<LogInInput>) -> Result<Viewer> {
        let data = ctx.data::<GraphQlData>()?;
        let session = ctx.data::<Arc<RequestSession>>()?;
        let code = input.and_then(|input| input.code);
        let outcome = data
            .viewer_service
            .log_in(session.credentials(), code.as_deref())
            .await
            .map_err(|err| err.extend())?;
        session.apply(outcome.session);
        Ok(Viewer(outcome.viewer))
    }

    /// Log out the current viewer.
    async fn log_out(&self, ctx: &Context<'_>) -> Result<Viewer> {
        let data = ctx.data::<GraphQlData>()?;
        let session = ctx.data::<Arc<RequestSession>>()?;
        let outcome = data.viewer_service.log_out();
        session.apply(outcome.session);
        Ok(Viewer(outcome.viewer))
    }

    /// Exchange a payment-gateway onboarding code for a wallet.
    async fn connect_wallet(
        &self,
        ctx: &Context<'_>,
        input: ConnectWalletInput,
    ) -> Result<Viewer> {
        let data = ctx.data::<GraphQlData>()?;
        let session = ctx.data::<Arc<RequestSession>>()?;
        let viewer = data
            .viewer_service
            .connect_wallet(session.credentials(), &input.code)
            .await
            .map_err(|err| err.extend())?;
        Ok(Viewer(viewer))
    }

    /// Deauthorise and clear the viewer's wallet.
    async fn disconnect_wallet(&self, ctx: &Context<'_>) -> Result<Viewer> {
        let data = ctx.data::<GraphQlData>()?;
        let session = ctx.data::<Arc<RequestSession>>()?;
        let viewer = data
            .viewer_service
            .disconnect_wallet(session.credentials())
            .await
            .map_err(|err| err.extend())?;
        Ok(Viewer(viewer))
    }
}

/// Resolve the viewer id a nested resolver should treat as authenticated.
pub(super) async fn authorized_viewer_id(
    ctx: &Context<'_>,
) -> Result<Option<UserId>> {
    let data = ctx.data::<GraphQlData>()?;
    let session = ctx.data::<Arc<RequestSession>>()?;
    let viewer = data
        .viewer_service
        .authorize(session.credentials())
        .await
        .map_err(|err| err.extend())?;
    Ok(viewer.map(|user| user.id))
}
