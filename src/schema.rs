diesel::table! {
    articles (id) {
        id -> Integer,
        #[max_length = 255]
        title -> Varchar,
        description -> Text,
        #[max_length = 255]
        image_url -> Nullable<Varchar>,
        #[max_length = 100]
        author -> Varchar,
        image_data -> Nullable<Binary>,
        #[max_length = 100]
        image_type -> Nullable<Varchar>,
        created_at -> Timestamp,
        updated_at -> Timestamp,
    }
}
