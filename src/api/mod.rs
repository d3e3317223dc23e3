//! JSON endpoints mirroring what the page shows

use axum::{
    Router,
    extract::{RawQuery, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
};
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::icebreaker;
use crate::location_resolver::{coordinate_from_query, share_url};
use crate::models::{IcebreakerCard, Receipt, WeatherReading};
use crate::session::{Services, Session};
use crate::state::{AppState, Event};

/// Shared by every request; each request gets its own [`Session`]
#[derive(Clone)]
pub struct AppContext {
    pub services: Services,
}

impl AppContext {
    /// The page URL with the request's query string
    pub fn page_url(&self, query: Option<&str>) -> Url {
        let mut url = self.services.share_base.clone();
        url.set_query(query);
        url
    }

    pub fn session(&self) -> Session<StdRng> {
        self.resume(AppState::default())
    }

    pub fn resume(&self, state: AppState) -> Session<StdRng> {
        Session::resume(self.services.clone(), StdRng::from_rng(&mut rand::rng()), state)
    }

    /// Run the page-load flow. With `locate`, the URL coordinate wins, then
    /// the device, then the fallback; without it only the URL is used.
    pub async fn load(&self, query: Option<&str>, locate: bool) -> AppState {
        let page_url = self.page_url(query);
        let mut session = self.session();
        if locate {
            let resolved = self.services.resolve_location(Some(&page_url)).await;
            session.run(Event::LocationResolved(resolved)).await;
        } else {
            let page_coordinate = coordinate_from_query(&page_url);
            session.run(Event::Started { page_coordinate }).await;
        }
        session.state().clone()
    }
}

#[derive(Serialize)]
pub struct ApiConditions {
    pub state: AppState,
    pub receipt: Receipt,
    pub share_url: Option<String>,
}

#[derive(Serialize, Deserialize)]
pub struct ApiShare {
    pub url: String,
}

pub fn router() -> Router<AppContext> {
    Router::new()
        .route("/conditions", get(get_conditions))
        .route("/share", get(get_share))
        .route("/icebreakers", post(post_icebreakers))
}

async fn get_conditions(
    State(ctx): State<AppContext>,
    RawQuery(query): RawQuery,
) -> Json<ApiConditions> {
    let state = ctx.load(query.as_deref(), true).await;
    let share_url = state
        .coordinate
        .map(|c| share_url(&ctx.services.share_base, c).to_string());
    Json(ApiConditions {
        receipt: Receipt::from(state.weather.as_ref()),
        share_url,
        state,
    })
}

async fn get_share(
    State(ctx): State<AppContext>,
    RawQuery(query): RawQuery,
) -> Result<Json<ApiShare>, StatusCode> {
    let coordinate =
        coordinate_from_query(&ctx.page_url(query.as_deref())).ok_or(StatusCode::BAD_REQUEST)?;
    Ok(Json(ApiShare {
        url: share_url(&ctx.services.share_base, coordinate).to_string(),
    }))
}

/// Cards for the posted reading; `null` gives the defaults
async fn post_icebreakers(
    Json(reading): Json<Option<WeatherReading>>,
) -> Json<[IcebreakerCard; icebreaker::CARD_COUNT]> {
    let mut rng = StdRng::from_rng(&mut rand::rng());
    Json(icebreaker::generate(reading.as_ref(), &mut rng))
}
