//! Listing workflows: hosting a new listing and searching existing ones.

use std::sync::Arc;

use super::availability::BookingsIndex;
use super::error::{DomainError, DomainResult};
use super::ids::ListingId;
use super::listing::{Listing, ListingType};
use super::ports::{
    Geocoder, ImageStore, ListingPage, ListingSearch, ListingStore, Page, PriceOrder, StoreError,
    UserStore,
};
use super::viewer::{SessionCredentials, authorize};

/// Longest accepted listing title, in characters.
pub const TITLE_MAX_CHARS: usize = 100;
/// Longest accepted listing description, in characters.
pub const DESCRIPTION_MAX_CHARS: usize = 5000;

/// Request to host a new listing, as received from the API layer.
#[derive(Debug, Clone)]
pub struct HostListingRequest {
    pub title: String,
    pub description: String,
    /// Base64-encoded photo, uploaded to the image host before persisting.
    pub image: String,
    pub listing_type: ListingType,
    /// Free-form address, geocoded into country/admin/city.
    pub address: String,
    /// Nightly price in the smallest currency unit.
    pub price: i64,
    pub num_of_guests: i32,
}

/// A search result page plus the human-readable region that was matched.
#[derive(Debug, Clone, Default)]
pub struct ListingsResult {
    /// Present when the search was narrowed to a geocoded location.
    pub region: Option<String>,
    pub total: i64,
    pub items: Vec<Listing>,
}

/// Orchestrates listing creation and search.
#[derive(Clone)]
pub struct ListingService {
    users: Arc<dyn UserStore>,
    listings: Arc<dyn ListingStore>,
    geocoder: Arc<dyn Geocoder>,
    images: Arc<dyn ImageStore>,
}

impl ListingService {
    /// Create a service over the given adapters.
    pub fn new(
        users: Arc<dyn UserStore>,
        listings: Arc<dyn ListingStore>,
        geocoder: Arc<dyn Geocoder>,
        images: Arc<dyn ImageStore>,
    ) -> Self {
        Self {
            users,
            listings,
            geocoder,
            images,
        }
    }

    /// Create a listing hosted by the viewer.
    ///
    /// Input validation runs before any external call; geocoding must yield a
    /// complete country/admin/city triple before the image upload is
    /// attempted.
    pub async fn host_listing(
        &self,
        credentials: &SessionCredentials,
        request: HostListingRequest,
    ) -> DomainResult<Listing> {
        validate_host_listing(&request)?;

        let viewer = authorize(self.users.as_ref(), credentials)
            .await
            .map_err(store_error)?
            .ok_or_else(|| DomainError::unauthenticated("viewer cannot be found"))?;

        let geocoded = self
            .geocoder
            .geocode(&request.address)
            .await
            .map_err(|err| DomainError::internal(format!("geocoding failed: {err}")))?;
        let (Some(country), Some(admin), Some(city)) =
            (geocoded.country, geocoded.admin, geocoded.city)
        else {
            return Err(DomainError::invalid_input("invalid address input"));
        };

        let image_url = self
            .images
            .upload(&request.image)
            .await
            .map_err(|err| DomainError::internal(format!("image upload failed: {err}")))?;

        let listing = Listing {
            id: ListingId::generate(),
            title: request.title,
            description: request.description,
            image: image_url,
            host: viewer.id,
            listing_type: request.listing_type,
            address: request.address,
            country,
            admin,
            city,
            price: request.price,
            num_of_guests: request.num_of_guests,
            bookings: Vec::new(),
            bookings_index: BookingsIndex::new(),
        };
        self.listings
            .create_for_host(&listing)
            .await
            .map_err(store_error)?;

        Ok(listing)
    }

    /// Fetch a listing, marking whether the viewer is its host.
    pub async fn listing(
        &self,
        credentials: &SessionCredentials,
        id: &ListingId,
    ) -> DomainResult<(Listing, bool)> {
        let listing = self
            .listings
            .find(id)
            .await
            .map_err(store_error)?
            .ok_or_else(|| DomainError::not_found("listing cannot be found"))?;
        let viewer = authorize(self.users.as_ref(), credentials)
            .await
            .map_err(store_error)?;
        let authorized = viewer.is_some_and(|viewer| viewer.id == listing.host);
        Ok((listing, authorized))
    }

    /// Search listings, optionally narrowed to a geocoded location.
    pub async fn listings(
        &self,
        location: Option<&str>,
        order: Option<PriceOrder>,
        page: Page,
    ) -> DomainResult<ListingsResult> {
        let mut search = ListingSearch {
            order,
            limit: page.limit,
            page: page.page,
            ..ListingSearch::default()
        };
        let mut region = None;

        if let Some(location) = location {
            let geocoded = self
                .geocoder
                .geocode(location)
                .await
                .map_err(|err| DomainError::internal(format!("geocoding failed: {err}")))?;
            let country = geocoded
                .country
                .map(|country| capitalize(&country))
                .ok_or_else(|| DomainError::invalid_input("no country found"))?;
            search.city = geocoded.city.map(|city| capitalize(&city));
            search.admin = geocoded.admin.map(|admin| capitalize(&admin));

            let mut parts: Vec<&str> = Vec::new();
            if let Some(city) = search.city.as_deref() {
                parts.push(city);
            }
            if let Some(admin) = search.admin.as_deref() {
                parts.push(admin);
            }
            parts.push(&country);
            region = Some(parts.join(", "));
            search.country = Some(country);
        }

        let ListingPage { total, items } = self
            .listings
            .search(&search)
            .await
            .map_err(store_error)?;
        Ok(ListingsResult {
            region,
            total,
            items,
        })
    }
}

fn validate_host_listing(request: &HostListingRequest) -> DomainResult<()> {
    if request.title.chars().count() > TITLE_MAX_CHARS {
        return Err(DomainError::invalid_input(format!(
            "listing title must be under {TITLE_MAX_CHARS} characters"
        )));
    }
    if request.description.chars().count() > DESCRIPTION_MAX_CHARS {
        return Err(DomainError::invalid_input(format!(
            "listing description must be under {DESCRIPTION_MAX_CHARS} characters"
        )));
    }
    if request.price < 1 {
        return Err(DomainError::invalid_input("price must be greater than zero"));
    }
    Ok(())
}

/// Capitalise each whitespace-separated word, lowering the remainder.
fn capitalize(text: &str) -> String {
    text.split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => {
                    first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase()
                }
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn store_error(err: StoreError) -> DomainError {
    DomainError::persistence(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::error::ErrorCode;
    use crate::domain::ids::UserId;
    use crate::domain::ports::{
        GeocodedAddress, MockGeocoder, MockImageStore, MockListingStore, MockUserStore,
    };
    use crate::domain::user::User;
    use rstest::rstest;

    fn viewer_user() -> User {
        User {
            id: UserId::new("host-1").expect("valid id"),
            name: "Nia".into(),
            token: "tok".into(),
            avatar: "https://img.invalid/nia.png".into(),
            contact: "nia@example.com".into(),
            wallet_id: Some("acct_1".into()),
            income: 0,
            bookings: Vec::new(),
            listings: Vec::new(),
        }
    }

    fn credentials() -> SessionCredentials {
        SessionCredentials {
            viewer_id: Some(UserId::new("host-1").expect("valid id")),
            csrf_token: Some("tok".into()),
        }
    }

    fn request() -> HostListingRequest {
        HostListingRequest {
            title: "Lighthouse loft".into(),
            description: "Sea views from every window".into(),
            image: "aGVsbG8=".into(),
            listing_type: ListingType::House,
            address: "1 Beacon Way, Ponta Delgada".into(),
            price: 12000,
            num_of_guests: 4,
        }
    }

    fn service(
        users: MockUserStore,
        listings: MockListingStore,
        geocoder: MockGeocoder,
        images: MockImageStore,
    ) -> ListingService {
        ListingService::new(
            Arc::new(users),
            Arc::new(listings),
            Arc::new(geocoder),
            Arc::new(images),
        )
    }

    #[rstest]
    #[case::oversized_title(HostListingRequest { title: "t".repeat(101), ..request() })]
    #[case::oversized_description(HostListingRequest { description: "d".repeat(5001), ..request() })]
    #[case::free_listing(HostListingRequest { price: 0, ..request() })]
    #[tokio::test]
    async fn invalid_input_is_rejected_before_any_external_call(
        #[case] bad_request: HostListingRequest,
    ) {
        let service = service(
            MockUserStore::new(),
            MockListingStore::new(),
            MockGeocoder::new(),
            MockImageStore::new(),
        );
        let err = service
            .host_listing(&credentials(), bad_request)
            .await
            .expect_err("validation must fail");
        assert_eq!(err.code(), ErrorCode::InvalidInput);
    }

    #[tokio::test]
    async fn incomplete_geocoding_aborts_before_image_upload() {
        let mut users = MockUserStore::new();
        users
            .expect_find_by_id_and_token()
            .return_once(|_, _| Ok(Some(viewer_user())));
        let mut geocoder = MockGeocoder::new();
        geocoder.expect_geocode().return_once(|_| {
            Ok(GeocodedAddress {
                country: Some("Portugal".into()),
                admin: None,
                city: Some("Ponta Delgada".into()),
            })
        });

        let service = service(users, MockListingStore::new(), geocoder, MockImageStore::new());
        let err = service
            .host_listing(&credentials(), request())
            .await
            .expect_err("incomplete address must fail");
        assert_eq!(err.code(), ErrorCode::InvalidInput);
    }

    #[tokio::test]
    async fn hosted_listing_carries_geocoded_fields_and_hosted_image() {
        let mut users = MockUserStore::new();
        users
            .expect_find_by_id_and_token()
            .return_once(|_, _| Ok(Some(viewer_user())));
        let mut geocoder = MockGeocoder::new();
        geocoder.expect_geocode().return_once(|_| {
            Ok(GeocodedAddress {
                country: Some("Portugal".into()),
                admin: Some("Azores".into()),
                city: Some("Ponta Delgada".into()),
            })
        });
        let mut images = MockImageStore::new();
        images
            .expect_upload()
            .return_once(|_| Ok("https://cdn.invalid/photo.png".into()));
        let mut listings = MockListingStore::new();
        listings
            .expect_create_for_host()
            .withf(|listing| {
                listing.host.as_str() == "host-1"
                    && listing.country == "Portugal"
                    && listing.city == "Ponta Delgada"
                    && listing.image == "https://cdn.invalid/photo.png"
                    && listing.bookings.is_empty()
                    && listing.bookings_index.is_empty()
            })
            .return_once(|_| Ok(()));

        let listing = service(users, listings, geocoder, images)
            .host_listing(&credentials(), request())
            .await
            .expect("hosting succeeds");
        assert_eq!(listing.admin, "Azores");
        assert_eq!(listing.price, 12000);
    }

    #[tokio::test]
    async fn location_search_capitalises_filters_and_reports_the_region() {
        let mut geocoder = MockGeocoder::new();
        geocoder.expect_geocode().return_once(|_| {
            Ok(GeocodedAddress {
                country: Some("portugal".into()),
                admin: Some("azores".into()),
                city: Some("ponta delgada".into()),
            })
        });
        let mut listings = MockListingStore::new();
        listings
            .expect_search()
            .withf(|search| {
                search.country.as_deref() == Some("Portugal")
                    && search.admin.as_deref() == Some("Azores")
                    && search.city.as_deref() == Some("Ponta Delgada")
            })
            .return_once(|_| Ok(ListingPage::default()));

        let result = service(MockUserStore::new(), listings, geocoder, MockImageStore::new())
            .listings(Some("ponta delgada"), None, Page { limit: 10, page: 1 })
            .await
            .expect("search succeeds");
        assert_eq!(result.region.as_deref(), Some("Ponta Delgada, Azores, Portugal"));
    }

    #[tokio::test]
    async fn location_without_a_country_is_invalid() {
        let mut geocoder = MockGeocoder::new();
        geocoder
            .expect_geocode()
            .return_once(|_| Ok(GeocodedAddress::default()));

        let service = service(
            MockUserStore::new(),
            MockListingStore::new(),
            geocoder,
            MockImageStore::new(),
        );
        let err = service
            .listings(Some("nowhere"), None, Page { limit: 10, page: 1 })
            .await
            .expect_err("unknown country must fail");
        assert_eq!(err.code(), ErrorCode::InvalidInput);
    }

    #[rstest]
    #[case("ponta delgada", "Ponta Delgada")]
    #[case("LISBON", "Lisbon")]
    #[case("new  york", "New  York")]
    fn capitalize_title_cases_each_word(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(capitalize(input), expected);
    }
}
