use std::str::FromStr;

use rust_decimal::Decimal;
use serde::Deserialize;
use utoipa::ToSchema;

pub const DEFAULT_PAGE_SIZE: u64 = 10;
pub const MAX_PAGE_SIZE: u64 = 100;

#[derive(Debug, Default, Clone, Deserialize, ToSchema)]
pub struct Pagination {
    pub page: Option<String>,
    pub page_size: Option<String>,
}

impl Pagination {
    /// `(page, page_size, offset)`. A non-numeric or zero page is reported as
    /// `None` so the caller can answer with "Invalid page.".
    pub fn normalize(&self) -> Option<(u64, u64, u64)> {
        let page = match self.page.as_deref().map(str::trim) {
            None | Some("") => 1,
            Some(raw) => raw.parse::<u64>().ok().filter(|p| *p >= 1)?,
        };
        let page_size = self
            .page_size
            .as_deref()
            .and_then(|raw| raw.trim().parse::<u64>().ok())
            .filter(|size| *size >= 1)
            .map(|size| size.min(MAX_PAGE_SIZE))
            .unwrap_or(DEFAULT_PAGE_SIZE);
        let offset = (page - 1).saturating_mul(page_size);
        Some((page, page_size, offset))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    Asc,
    Desc,
}

pub fn split_ordering(raw: &str) -> (&str, SortOrder) {
    match raw.trim().strip_prefix('-') {
        Some(field) => (field, SortOrder::Desc),
        None => (raw.trim(), SortOrder::Asc),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OfferSortBy {
    Id,
    Title,
    Description,
    Owner,
    CreatedAt,
    UpdatedAt,
    MinPrice,
    MinDeliveryTime,
}

impl FromStr for OfferSortBy {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "id" => Ok(OfferSortBy::Id),
            "title" => Ok(OfferSortBy::Title),
            "description" => Ok(OfferSortBy::Description),
            "owner" | "owner_id" | "user" => Ok(OfferSortBy::Owner),
            "created_at" => Ok(OfferSortBy::CreatedAt),
            "updated_at" => Ok(OfferSortBy::UpdatedAt),
            "min_price" => Ok(OfferSortBy::MinPrice),
            "min_delivery_time" => Ok(OfferSortBy::MinDeliveryTime),
            _ => Err(()),
        }
    }
}

impl OfferSortBy {
    pub fn as_str(&self) -> &'static str {
        match self {
            OfferSortBy::Id => "id",
            OfferSortBy::Title => "title",
            OfferSortBy::Description => "description",
            OfferSortBy::Owner => "owner",
            OfferSortBy::CreatedAt => "created_at",
            OfferSortBy::UpdatedAt => "updated_at",
            OfferSortBy::MinPrice => "min_price",
            OfferSortBy::MinDeliveryTime => "min_delivery_time",
        }
    }
}

#[derive(Debug, Default, Clone, Deserialize, ToSchema)]
pub struct OfferListParams {
    pub creator_id: Option<String>,
    pub min_price: Option<String>,
    pub max_delivery_time: Option<String>,
    pub ordering: Option<String>,
    pub search: Option<String>,
    #[serde(flatten)]
    pub pagination: Pagination,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OfferQuery {
    pub creator_id: Option<i32>,
    pub min_price: Option<Decimal>,
    pub max_delivery_time: Option<i32>,
    pub search: Option<String>,
    pub sort_by: OfferSortBy,
    pub sort_order: SortOrder,
}

impl Default for OfferQuery {
    fn default() -> Self {
        Self {
            creator_id: None,
            min_price: None,
            max_delivery_time: None,
            search: None,
            sort_by: OfferSortBy::CreatedAt,
            sort_order: SortOrder::Desc,
        }
    }
}

impl From<&OfferListParams> for OfferQuery {
    fn from(params: &OfferListParams) -> Self {
        let defaults = OfferQuery::default();
        let (sort_by, sort_order) = params
            .ordering
            .as_deref()
            .filter(|raw| !raw.trim().is_empty())
            .and_then(|raw| {
                let (field, order) = split_ordering(raw);
                field.parse::<OfferSortBy>().ok().map(|by| (by, order))
            })
            .unwrap_or((defaults.sort_by, defaults.sort_order));

        Self {
            creator_id: parse_trimmed(params.creator_id.as_deref()),
            min_price: parse_trimmed(params.min_price.as_deref()),
            max_delivery_time: parse_trimmed(params.max_delivery_time.as_deref()),
            search: params
                .search
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string),
            sort_by,
            sort_order,
        }
    }
}

impl OfferQuery {
    pub fn page_query(
        &self,
        page: u64,
        page_size: u64,
    ) -> Result<String, serde_urlencoded::ser::Error> {
        let mut pairs: Vec<(&str, String)> = Vec::new();
        if let Some(creator_id) = self.creator_id {
            pairs.push(("creator_id", creator_id.to_string()));
        }
        if let Some(min_price) = self.min_price {
            pairs.push(("min_price", min_price.to_string()));
        }
        if let Some(max_delivery_time) = self.max_delivery_time {
            pairs.push(("max_delivery_time", max_delivery_time.to_string()));
        }
        if let Some(search) = &self.search {
            pairs.push(("search", search.clone()));
        }
        let prefix = match self.sort_order {
            SortOrder::Asc => "",
            SortOrder::Desc => "-",
        };
        pairs.push(("ordering", format!("{prefix}{}", self.sort_by.as_str())));
        pairs.push(("page", page.to_string()));
        pairs.push(("page_size", page_size.to_string()));
        serde_urlencoded::to_string(&pairs)
    }
}

fn parse_trimmed<T: FromStr>(raw: Option<&str>) -> Option<T> {
    raw.map(str::trim)
        .filter(|s| !s.is_empty())
        .and_then(|s| s.parse().ok())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewSortBy {
    UpdatedAt,
    Rating,
}

#[derive(Debug, Default, Clone, Deserialize, ToSchema)]
pub struct ReviewListParams {
    pub business_user_id: Option<String>,
    pub reviewer_id: Option<String>,
    pub ordering: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReviewQuery {
    pub business_user_id: Option<i32>,
    pub reviewer_id: Option<i32>,
    pub sort_by: ReviewSortBy,
    pub sort_order: SortOrder,
}

impl From<&ReviewListParams> for ReviewQuery {
    fn from(params: &ReviewListParams) -> Self {
        let (sort_by, sort_order) = params
            .ordering
            .as_deref()
            .and_then(|raw| match split_ordering(raw) {
                ("updated_at", order) => Some((ReviewSortBy::UpdatedAt, order)),
                ("rating", order) => Some((ReviewSortBy::Rating, order)),
                _ => None,
            })
            .unwrap_or((ReviewSortBy::UpdatedAt, SortOrder::Desc));

        Self {
            business_user_id: parse_trimmed(params.business_user_id.as_deref()),
            reviewer_id: parse_trimmed(params.reviewer_id.as_deref()),
            sort_by,
            sort_order,
        }
    }
}
