table! {
    clients (client_id) {
        client_id -> Text,
        secret_hash -> Text,
        name -> Text,
        confidential -> Bool,
        active -> Bool,
    }
}

table! {
    client_scopes (client_id, scope) {
        client_id -> Text,
        scope -> Text,
    }
}

table! {
    uris (client_id, uri) {
        client_id -> Text,
        uri -> Text,
    }
}

table! {
    consents (client_id, subject) {
        client_id -> Text,
        subject -> Text,
        scope -> Text,
        created_at -> Int8,
    }
}

table! {
    codes (code_hash) {
        code_hash -> Text,
        client_id -> Text,
        subject -> Text,
        redirect_uri -> Text,
        scope -> Text,
        used -> Bool,
        invalid_after -> Int8,
    }
}

table! {
    refresh_tokens (token_hash) {
        token_hash -> Text,
        client_id -> Text,
        subject -> Text,
        scope -> Text,
        revoked -> Bool,
        invalid_after -> Int8,
    }
}

allow_tables_to_appear_in_same_query!(
    clients,
    client_scopes,
    uris,
    consents,
    codes,
    refresh_tokens,
);
