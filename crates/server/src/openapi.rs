use serde::Serialize;
use utoipa::OpenApi;
use utoipa::ToSchema;

#[derive(Serialize, ToSchema)]
pub struct HealthResponse { pub status: String }

#[derive(Serialize, ToSchema)]
pub struct IconDoc {
    pub id: i32,
    #[serde(rename = "htmlCode")]
    pub html_code: String,
    pub name: String,
}

#[derive(Serialize, ToSchema)]
pub struct IconInputDoc {
    #[serde(rename = "htmlCode")]
    #[schema(min_length = 1, max_length = 6)]
    pub html_code: String,
    #[schema(min_length = 1)]
    pub name: String,
}

#[derive(Serialize, ToSchema)]
pub struct CreateEmojiDoc {
    pub data: IconInputDoc,
    pub applicant: String,
    pub recipient: String,
}

#[derive(Serialize, ToSchema)]
pub struct DatabaseInfoDoc { pub database_name: String, pub database_type: String }

#[derive(Serialize, ToSchema)]
pub struct MessageEnvelopeDoc { pub message: String, pub status: u16 }

#[derive(Serialize, ToSchema)]
pub struct IconEnvelopeDoc { pub message: String, pub data: Option<IconDoc>, pub status: u16 }

#[derive(Serialize, ToSchema)]
pub struct IconListEnvelopeDoc { pub message: String, pub data: Option<Vec<IconDoc>>, pub status: u16 }

#[derive(Serialize, ToSchema)]
pub struct DatabaseInfoEnvelopeDoc { pub message: String, pub data: Option<DatabaseInfoDoc>, pub status: u16 }

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::routes::health,
        crate::routes::database_name,
        crate::routes::get_all,
        crate::routes::get_one,
        crate::routes::create_new_emoji,
    ),
    components(
        schemas(
            HealthResponse,
            IconDoc,
            IconInputDoc,
            CreateEmojiDoc,
            DatabaseInfoDoc,
            MessageEnvelopeDoc,
            IconEnvelopeDoc,
            IconListEnvelopeDoc,
            DatabaseInfoEnvelopeDoc,
        )
    ),
    tags(
        (name = "health"),
        (name = "emoji")
    )
)]
pub struct ApiDoc;
