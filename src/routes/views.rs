//! Server-rendered pages.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Response,
    routing::get,
    Router,
};

use crate::error::AppError;
use crate::http::response::{escape_html, html};
use crate::models::{Review, Tour};
use crate::routes::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(overview))
        .route("/tour/{slug}", get(tour_page))
}

fn tour_card(tour: &Tour) -> String {
    format!(
        concat!(
            "<div class=\"card\">\n",
            "<div class=\"card__header\"><img class=\"card__picture-img\" src=\"/img/tours/{cover}\" alt=\"{name}\">",
            "<h3 class=\"heading-tertirary\"><span>{name}</span></h3></div>\n",
            "<div class=\"card__details\">\n",
            "<h4 class=\"card__sub-heading\">{difficulty} {duration}-day tour</h4>\n",
            "<p class=\"card__text\">{summary}</p>\n",
            "</div>\n",
            "<div class=\"card__footer\">\n",
            "<p><span class=\"card__footer-value\">${price}</span> <span class=\"card__footer-text\">per person</span></p>\n",
            "<p class=\"card__ratings\"><span class=\"card__footer-value\">{rating}</span> ",
            "<span class=\"card__footer-text\">rating ({quantity})</span></p>\n",
            "<a class=\"btn btn--green btn--small\" href=\"/tour/{slug}\">Details</a>\n",
            "</div>\n",
            "</div>"
        ),
        cover = escape_html(&tour.image_cover),
        name = escape_html(&tour.name),
        difficulty = tour.difficulty.as_str(),
        duration = tour.duration,
        summary = escape_html(&tour.summary),
        price = tour.price,
        rating = tour.ratings_average,
        quantity = tour.ratings_quantity,
        slug = escape_html(&tour.slug),
    )
}

async fn overview(State(state): State<AppState>) -> Response {
    let mut tours = state.store.tours.find_visible(|_| true);
    tours.sort_by(|a, b| b.created_at.cmp(&a.created_at));

    let cards: Vec<String> = tours.iter().map(tour_card).collect();
    let body = format!("<div class=\"card-container\">\n{}\n</div>", cards.join("\n"));
    html(StatusCode::OK, "All Tours", &body)
}

fn review_card(review: &Review) -> String {
    format!(
        "<div class=\"reviews__card\"><p class=\"reviews__text\">{}</p><div class=\"reviews__rating\">{} / 5</div></div>",
        escape_html(&review.review),
        review.rating
    )
}

async fn tour_page(State(state): State<AppState>, Path(slug): Path<String>) -> Result<Response, AppError> {
    let tour = state
        .store
        .tours
        .find_visible(|t| t.slug == slug)
        .into_iter()
        .next()
        .ok_or_else(|| AppError::not_found("There is no tour with that name."))?;

    let reviews: Vec<String> = state
        .store
        .reviews
        .find(|r| r.tour == tour.id)
        .iter()
        .map(review_card)
        .collect();
    let description = tour.description.as_deref().unwrap_or(&tour.summary);
    let dates: Vec<String> = tour
        .start_dates
        .iter()
        .map(|d| d.format("%B %Y").to_string())
        .collect();

    let body = format!(
        concat!(
            "<section class=\"section-header\"><h1 class=\"heading-primary\"><span>{name} tour</span></h1>",
            "<div class=\"heading-box__group\">{duration} days</div></section>\n",
            "<section class=\"section-description\">\n",
            "<div class=\"overview-box__detail\">Difficulty: {difficulty}</div>\n",
            "<div class=\"overview-box__detail\">Participants: {group} people</div>\n",
            "<div class=\"overview-box__detail\">Rating: {rating} / 5</div>\n",
            "<div class=\"overview-box__detail\">Next dates: {dates}</div>\n",
            "<p class=\"description__text\">{description}</p>\n",
            "</section>\n",
            "<section class=\"section-reviews\"><div class=\"reviews\">{reviews}</div></section>"
        ),
        name = escape_html(&tour.name),
        duration = tour.duration,
        difficulty = tour.difficulty.as_str(),
        group = tour.max_group_size,
        rating = tour.ratings_average,
        dates = escape_html(&dates.join(", ")),
        description = escape_html(description),
        reviews = reviews.join("\n"),
    );
    Ok(html(StatusCode::OK, &format!("{} Tour", tour.name), &body))
}
