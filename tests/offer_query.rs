use coderr_api::{
    routes::params::{
        OfferListParams, OfferQuery, OfferSortBy, Pagination, ReviewListParams, ReviewQuery,
        ReviewSortBy, SortOrder,
    },
    services::offer_service::offer_finder,
};
use rust_decimal::Decimal;
use sea_orm::{DbBackend, QueryTrait};

fn params(pairs: &[(&str, &str)]) -> OfferListParams {
    let mut params = OfferListParams::default();
    for (key, value) in pairs {
        let value = Some(value.to_string());
        match *key {
            "creator_id" => params.creator_id = value,
            "min_price" => params.min_price = value,
            "max_delivery_time" => params.max_delivery_time = value,
            "ordering" => params.ordering = value,
            "search" => params.search = value,
            "page" => params.pagination.page = value,
            "page_size" => params.pagination.page_size = value,
            other => panic!("unknown parameter {other}"),
        }
    }
    params
}

fn sql(query: &OfferQuery) -> String {
    offer_finder(query).build(DbBackend::Postgres).sql
}

#[test]
fn defaults_to_newest_first() {
    let query = OfferQuery::from(&OfferListParams::default());
    assert_eq!(query, OfferQuery::default());
    assert_eq!(query.sort_by, OfferSortBy::CreatedAt);
    assert_eq!(query.sort_order, SortOrder::Desc);
}

#[test]
fn non_numeric_filters_are_ignored() {
    let query = OfferQuery::from(&params(&[
        ("min_price", "cheap"),
        ("max_delivery_time", "soon"),
        ("creator_id", "abc"),
    ]));
    assert_eq!(query.min_price, None);
    assert_eq!(query.max_delivery_time, None);
    assert_eq!(query.creator_id, None);
    assert!(!sql(&query).contains("MIN("));
}

#[test]
fn parses_filters_and_descending_min_price() {
    let query = OfferQuery::from(&params(&[
        ("creator_id", "7"),
        ("min_price", "49.5"),
        ("max_delivery_time", " 5 "),
        ("ordering", "-min_price"),
        ("search", "  logo "),
    ]));
    assert_eq!(query.creator_id, Some(7));
    assert_eq!(query.min_price, Some(Decimal::new(495, 1)));
    assert_eq!(query.max_delivery_time, Some(5));
    assert_eq!(query.search.as_deref(), Some("logo"));
    assert_eq!(query.sort_by, OfferSortBy::MinPrice);
    assert_eq!(query.sort_order, SortOrder::Desc);
}

#[test]
fn unknown_ordering_falls_back_to_default() {
    let query = OfferQuery::from(&params(&[("ordering", "password")]));
    assert_eq!(query.sort_by, OfferSortBy::CreatedAt);
    assert_eq!(query.sort_order, SortOrder::Desc);
}

#[test]
fn finder_filters_on_tier_minimums() {
    let query = OfferQuery::from(&params(&[("min_price", "50"), ("max_delivery_time", "3")]));
    let sql = sql(&query);
    assert!(sql.contains("SELECT MIN(d.price) FROM offer_details d"));
    assert!(sql.contains("SELECT MIN(d.delivery_time_in_days) FROM offer_details d"));
}

#[test]
fn finder_searches_title_and_description() {
    let query = OfferQuery::from(&params(&[("search", "logo")]));
    let sql = sql(&query);
    assert!(sql.contains(r#""title" ILIKE"#));
    assert!(sql.contains(r#""description" ILIKE"#));
}

#[test]
fn finder_orders_with_id_tiebreak() {
    let newest = sql(&OfferQuery::default());
    assert!(newest.contains(r#"ORDER BY "offers"."created_at" DESC, "offers"."id" ASC"#));

    let cheapest = sql(&OfferQuery::from(&params(&[("ordering", "min_price")])));
    assert!(cheapest.contains("ORDER BY (SELECT MIN(d.price)"));
}

#[test]
fn page_query_round_trips_the_filters() {
    let query = OfferQuery::from(&params(&[("creator_id", "3"), ("search", "a b&c")]));
    assert_eq!(
        query.page_query(2, 10).unwrap(),
        "creator_id=3&search=a+b%26c&ordering=-created_at&page=2&page_size=10"
    );
}

#[test]
fn page_query_percent_encodes_non_ascii_search_terms() {
    let query = OfferQuery::from(&params(&[("search", "café=logo"), ("ordering", "min_price")]));
    assert_eq!(
        query.page_query(1, 5).unwrap(),
        "search=caf%C3%A9%3Dlogo&ordering=min_price&page=1&page_size=5"
    );
}

#[test]
fn pagination_defaults_and_clamps() {
    assert_eq!(Pagination::default().normalize(), Some((1, 10, 0)));

    let pagination = Pagination {
        page: Some("3".into()),
        page_size: Some("500".into()),
    };
    assert_eq!(pagination.normalize(), Some((3, 100, 200)));

    let garbage_size = Pagination {
        page: None,
        page_size: Some("lots".into()),
    };
    assert_eq!(garbage_size.normalize(), Some((1, 10, 0)));

    for page in ["0", "first", "-1"] {
        let pagination = Pagination {
            page: Some(page.into()),
            page_size: None,
        };
        assert_eq!(pagination.normalize(), None, "page={page}");
    }
}

#[test]
fn review_ordering_accepts_rating_and_updated_at() {
    let by_rating = ReviewQuery::from(&ReviewListParams {
        business_user_id: Some("4".into()),
        reviewer_id: None,
        ordering: Some("rating".into()),
    });
    assert_eq!(by_rating.business_user_id, Some(4));
    assert_eq!(by_rating.sort_by, ReviewSortBy::Rating);
    assert_eq!(by_rating.sort_order, SortOrder::Asc);

    let fallback = ReviewQuery::from(&ReviewListParams {
        ordering: Some("description".into()),
        ..Default::default()
    });
    assert_eq!(fallback.sort_by, ReviewSortBy::UpdatedAt);
    assert_eq!(fallback.sort_order, SortOrder::Desc);
}
