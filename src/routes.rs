use poem::Route;
use poem_openapi::param::Path;
use poem_openapi::payload::Json;
use poem_openapi::types::multipart::Upload;
use poem_openapi::{ApiResponse, Multipart, OpenApi, OpenApiService};
use serde::Serialize;
use serde_json::{json, Value};

use crate::error::FormError;
use crate::models::{self, Banner, Category, Product, ResourceKind};
use crate::processor::VariantGenerator;
use crate::utils;
use crate::writethrough::WriteThroughStore;

/// Builds the full application route: the three resource APIs plus
/// the API reference UI.
pub fn build_route(store: WriteThroughStore, images: VariantGenerator) -> Route {
    let api = OpenApiService::new(
        (
            ProductsApi {
                store: store.clone(),
                images: images.clone(),
            },
            BannersApi {
                store: store.clone(),
                images: images.clone(),
            },
            CategoriesApi { store, images },
        ),
        "Vitrine API",
        env!("CARGO_PKG_VERSION"),
    );
    let docs = api.redoc();

    Route::new().nest("/docs", docs).nest("/", api)
}

#[derive(ApiResponse)]
pub enum DeleteResponse {
    /// The record and any cached copy are gone.
    #[oai(status = 204)]
    Deleted,
}

fn respond<T: Serialize>(record: &T) -> poem::Result<Json<Value>> {
    let value = serde_json::to_value(record).map_err(poem::error::InternalServerError)?;
    Ok(Json(value))
}

async fn read_upload(file: Upload) -> Result<Vec<u8>, FormError> {
    file.into_vec().await.map_err(FormError::UnreadableUpload)
}

#[derive(Debug, Multipart)]
pub struct ProductCreateForm {
    category: String,
    desc: String,
    name: String,
    #[oai(rename = "newPrice")]
    new_price: String,
    #[oai(rename = "oldPrice")]
    old_price: Option<String>,
    quantity: String,
    season: String,
    #[oai(rename = "type")]
    kind: String,
    image: Option<Upload>,
}

#[derive(Debug, Multipart)]
pub struct ProductUpdateForm {
    category: String,
    desc: String,
    name: String,
    new_price: String,
    old_price: Option<String>,
    quantity: String,
    season: String,
    #[oai(rename = "type")]
    kind: String,
    image: Option<Upload>,
}

pub struct ProductsApi {
    store: WriteThroughStore,
    images: VariantGenerator,
}

#[OpenApi]
impl ProductsApi {
    #[oai(path = "/products", method = "get")]
    async fn list(&self) -> poem::Result<Json<Value>> {
        let products = self.store.list::<Product>().await?;
        Ok(Json(json!({ "products": products })))
    }

    #[oai(path = "/products", method = "post")]
    async fn create(&self, form: ProductCreateForm) -> poem::Result<Json<Value>> {
        // Coercion comes first so a malformed field can never leave
        // orphaned uploads or a partial write behind.
        let new_price = models::required_f64("newPrice", &form.new_price)?;
        let old_price = models::optional_f64("oldPrice", form.old_price.as_deref())?;
        let quantity = models::required_u32("quantity", &form.quantity)?;

        let file = form.image.ok_or(FormError::MissingImage)?;
        let data = read_upload(file).await?;

        let id = utils::new_id();
        let variants = self.images.generate(&id, data).await?;

        let product = Product {
            id,
            category: form.category,
            desc: form.desc,
            name: form.name,
            new_price,
            old_price,
            quantity,
            season: form.season,
            kind: form.kind,
            image: Some(variants),
            created_at: utils::epoch_ms(),
            updated_at: None,
        };

        self.store.save(&product).await?;
        respond(&product)
    }

    /// Replaces the record. The stored image mapping and creation
    /// time are carried over when no new file is uploaded.
    #[oai(path = "/products/:id", method = "put")]
    async fn update(&self, id: Path<String>, form: ProductUpdateForm) -> poem::Result<Json<Value>> {
        let existing = self.store.fetch::<Product>(&id.0).await?;

        let new_price = models::required_f64("new_price", &form.new_price)?;
        let old_price = models::optional_f64("old_price", form.old_price.as_deref())?;
        let quantity = models::required_u32("quantity", &form.quantity)?;

        let image = match form.image {
            Some(file) => {
                let data = read_upload(file).await?;
                Some(self.images.generate(&id.0, data).await?)
            }
            None => existing.image,
        };

        let product = Product {
            id: id.0,
            category: form.category,
            desc: form.desc,
            name: form.name,
            new_price,
            old_price,
            quantity,
            season: form.season,
            kind: form.kind,
            image,
            created_at: existing.created_at,
            updated_at: Some(utils::epoch_ms()),
        };

        self.store.save(&product).await?;
        respond(&product)
    }

    #[oai(path = "/products/:id", method = "delete")]
    async fn delete(&self, id: Path<String>) -> poem::Result<DeleteResponse> {
        self.store.delete(ResourceKind::Product, &id.0).await?;
        Ok(DeleteResponse::Deleted)
    }
}

#[derive(Debug, Multipart)]
pub struct BannerCreateForm {
    name: String,
    category: Option<String>,
    image: Option<Upload>,
}

#[derive(Debug, Multipart)]
pub struct BannerUpdateForm {
    name: String,
    category: Option<String>,
    #[oai(rename = "isActive")]
    is_active: Option<String>,
    image: Option<Upload>,
}

pub struct BannersApi {
    store: WriteThroughStore,
    images: VariantGenerator,
}

#[OpenApi]
impl BannersApi {
    #[oai(path = "/banners", method = "get")]
    async fn list(&self) -> poem::Result<Json<Value>> {
        let banners = self.store.list::<Banner>().await?;
        Ok(Json(json!({ "banners": banners })))
    }

    #[oai(path = "/banners", method = "post")]
    async fn create(&self, form: BannerCreateForm) -> poem::Result<Json<Value>> {
        let file = form.image.ok_or(FormError::MissingImage)?;
        let data = read_upload(file).await?;

        let id = utils::new_id();
        let variants = self.images.generate(&id, data).await?;

        let banner = Banner {
            id,
            category: form.category,
            name: form.name,
            image: Some(variants),
            is_active: true,
            created_at: utils::epoch_ms(),
            updated_at: None,
        };

        self.store.save(&banner).await?;
        respond(&banner)
    }

    #[oai(path = "/banners/:id", method = "put")]
    async fn update(&self, id: Path<String>, form: BannerUpdateForm) -> poem::Result<Json<Value>> {
        let existing = self.store.fetch::<Banner>(&id.0).await?;

        let is_active = models::optional_bool("isActive", form.is_active.as_deref())?
            .unwrap_or(existing.is_active);

        let image = match form.image {
            Some(file) => {
                let data = read_upload(file).await?;
                Some(self.images.generate(&id.0, data).await?)
            }
            None => existing.image,
        };

        let banner = Banner {
            id: id.0,
            category: form.category,
            name: form.name,
            image,
            is_active,
            created_at: existing.created_at,
            updated_at: Some(utils::epoch_ms()),
        };

        self.store.save(&banner).await?;
        respond(&banner)
    }

    #[oai(path = "/banners/:id", method = "delete")]
    async fn delete(&self, id: Path<String>) -> poem::Result<DeleteResponse> {
        self.store.delete(ResourceKind::Banner, &id.0).await?;
        Ok(DeleteResponse::Deleted)
    }
}

#[derive(Debug, Multipart)]
pub struct CategoryCreateForm {
    name: String,
    description: Option<String>,
    priority: Option<String>,
    image: Option<Upload>,
}

#[derive(Debug, Multipart)]
pub struct CategoryUpdateForm {
    name: String,
    description: Option<String>,
    priority: Option<String>,
    #[oai(rename = "isActive")]
    is_active: Option<String>,
    image: Option<Upload>,
}

pub struct CategoriesApi {
    store: WriteThroughStore,
    images: VariantGenerator,
}

#[OpenApi]
impl CategoriesApi {
    #[oai(path = "/categories", method = "get")]
    async fn list(&self) -> poem::Result<Json<Value>> {
        let categories = self.store.list::<Category>().await?;
        Ok(Json(json!({ "categories": categories })))
    }

    #[oai(path = "/categories", method = "post")]
    async fn create(&self, form: CategoryCreateForm) -> poem::Result<Json<Value>> {
        let priority = models::optional_u32("priority", form.priority.as_deref())?;

        let file = form.image.ok_or(FormError::MissingImage)?;
        let data = read_upload(file).await?;

        let id = utils::new_id();
        let variants = self.images.generate(&id, data).await?;

        let category = Category {
            id,
            name: form.name,
            description: form.description,
            priority,
            image: Some(variants),
            is_active: true,
            created_at: utils::epoch_ms(),
            updated_at: None,
        };

        self.store.save(&category).await?;
        respond(&category)
    }

    #[oai(path = "/categories/:id", method = "put")]
    async fn update(
        &self,
        id: Path<String>,
        form: CategoryUpdateForm,
    ) -> poem::Result<Json<Value>> {
        let existing = self.store.fetch::<Category>(&id.0).await?;

        let priority = models::optional_u32("priority", form.priority.as_deref())?;
        let is_active = models::optional_bool("isActive", form.is_active.as_deref())?
            .unwrap_or(existing.is_active);

        let image = match form.image {
            Some(file) => {
                let data = read_upload(file).await?;
                Some(self.images.generate(&id.0, data).await?)
            }
            None => existing.image,
        };

        let category = Category {
            id: id.0,
            name: form.name,
            description: form.description,
            priority,
            image,
            is_active,
            created_at: existing.created_at,
            updated_at: Some(utils::epoch_ms()),
        };

        self.store.save(&category).await?;
        respond(&category)
    }

    #[oai(path = "/categories/:id", method = "delete")]
    async fn delete(&self, id: Path<String>) -> poem::Result<DeleteResponse> {
        self.store.delete(ResourceKind::Category, &id.0).await?;
        Ok(DeleteResponse::Deleted)
    }
}
