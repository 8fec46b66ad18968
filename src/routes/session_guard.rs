use tracing::debug;

use crate::routes::Route;

/// Where a navigation request actually lands.
///
/// The only check is whether a session exists. Ownership checks in the views
/// are cosmetic, the API decides what a user may do.
pub fn resolve(requested: Route, signed_in: bool) -> Route {
    // 1. The root and unknown paths pick a landing page
    let resolved = match requested {
        Route::Root | Route::NotFound => {
            if signed_in {
                Route::Dashboard
            } else {
                Route::Login
            }
        }
        // 2. Signed-in users never see the auth forms
        Route::Login | Route::Register if signed_in => Route::Dashboard,
        // 3. Everything else needs a session
        route if route.requires_session() && !signed_in => Route::Login,
        route => route,
    };

    if resolved != requested {
        debug!("Redirecting {} to {}", requested, resolved);
    }
    resolved
}
