//! Schema of the `users` collection.

use super::{FieldConstraint, SchemaError, ValidatedCollectionSpec};

/// Collection holding user accounts.
pub const USERS_COLLECTION: &str = "users";

/// Builds the validated spec for the `users` collection.
pub fn users_collection_spec() -> Result<ValidatedCollectionSpec, SchemaError> {
    ValidatedCollectionSpec::builder(USERS_COLLECTION)
        .require([
            "username",
            "firstName",
            "lastName",
            "email",
            "password",
            "mobileNumber",
        ])
        .field(
            "username",
            FieldConstraint::string()
                .max_length(75)
                .describe("'username' is required and is a string"),
        )
        .field(
            "firstName",
            FieldConstraint::string()
                .min_length(2)
                .max_length(75)
                .describe("'firstName' is required and is a string"),
        )
        .field(
            "lastName",
            FieldConstraint::string()
                .min_length(2)
                .max_length(75)
                .describe("'lastName' is required and is a string"),
        )
        .field(
            "email",
            FieldConstraint::string().describe("'email' is required and is a string"),
        )
        .field(
            "password",
            FieldConstraint::string().describe("'password' is required and is a string"),
        )
        .field(
            "mobileNumber",
            FieldConstraint::string()
                .max_length(10)
                .describe("'mobileNumber' is an optional field and is a string"),
        )
        .field(
            "verified",
            FieldConstraint::bool().describe("'verified' is an optional field and is a boolean"),
        )
        .field(
            "verificationToken",
            FieldConstraint::string()
                .max_length(6)
                .describe("'verificationToken' is required and is a string"),
        )
        .field(
            "activeStatus",
            FieldConstraint::bool()
                .describe("Status with a default value of 'active' or 'inactive'."),
        )
        .field(
            "oauthProfiles",
            FieldConstraint::array()
                .max_items(5)
                .describe("'oauthProfiles' is an optional field and is an array"),
        )
        .field(
            "acceptTerms",
            FieldConstraint::bool().describe("'acceptTerms' is an optional field and is a boolean"),
        )
        .field(
            "createdAt",
            FieldConstraint::date()
                .describe("Creation date with a default value of the current date."),
        )
        .field(
            "lastUpdatedAt",
            FieldConstraint::date()
                .describe("Creation date with a default value of the last updated date."),
        )
        .field(
            "lastLoginAt",
            FieldConstraint::date()
                .describe("Creation date with a default value of the last login date."),
        )
        .additional_properties(true)
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{BsonType, Violation};
    use mongodb::bson::{doc, Bson, DateTime, Document};

    fn complete_user() -> Document {
        doc! {
            "username": "a",
            "firstName": "Jo",
            "lastName": "Smith",
            "email": "j@x.com",
            "password": "hash",
            "mobileNumber": "5551234567",
        }
    }

    #[test]
    fn test_required_fields() {
        let spec = users_collection_spec().unwrap();
        assert_eq!(spec.name(), "users");
        assert_eq!(
            spec.required(),
            [
                "username",
                "firstName",
                "lastName",
                "email",
                "password",
                "mobileNumber"
            ]
        );
        assert!(spec.additional_properties());
        assert_eq!(spec.fields().count(), 14);
    }

    #[test]
    fn test_complete_user_without_optional_fields_is_accepted() {
        let spec = users_collection_spec().unwrap();
        assert_eq!(spec.check(&complete_user()), Ok(()));
    }

    #[test]
    fn test_user_without_password_is_rejected() {
        let spec = users_collection_spec().unwrap();
        let mut user = complete_user();
        user.remove("password");

        let violations = spec.check(&user).unwrap_err();
        assert_eq!(violations, vec![Violation::MissingField("password".into())]);
    }

    #[test]
    fn test_each_missing_required_field_is_rejected() {
        let spec = users_collection_spec().unwrap();
        for field in spec.required() {
            let mut user = complete_user();
            user.remove(field);
            let violations = spec.check(&user).unwrap_err();
            assert_eq!(violations, vec![Violation::MissingField(field.clone())]);
        }
    }

    #[test]
    fn test_long_mobile_number_is_rejected() {
        let spec = users_collection_spec().unwrap();
        let mut user = complete_user();
        user.insert("mobileNumber", "55512345678");

        let violations = spec.check(&user).unwrap_err();
        assert_eq!(
            violations,
            vec![Violation::TooLong {
                field: "mobileNumber".into(),
                max: 10,
                actual: 11
            }]
        );
    }

    #[test]
    fn test_too_many_oauth_profiles_is_rejected() {
        let spec = users_collection_spec().unwrap();
        let profile = doc! { "provider": "google", "id": "1" };

        let mut user = complete_user();
        user.insert("oauthProfiles", vec![Bson::Document(profile.clone()); 5]);
        assert!(spec.check(&user).is_ok());

        user.insert("oauthProfiles", vec![Bson::Document(profile); 6]);
        let violations = spec.check(&user).unwrap_err();
        assert!(matches!(
            violations.as_slice(),
            [Violation::TooManyItems { max: 5, actual: 6, .. }]
        ));
    }

    #[test]
    fn test_undeclared_fields_are_accepted() {
        let spec = users_collection_spec().unwrap();
        let mut user = complete_user();
        user.insert("favouriteColour", "teal");
        user.insert("loginCount", 3);
        assert!(spec.check(&user).is_ok());
    }

    #[test]
    fn test_optional_fields_are_type_checked() {
        let spec = users_collection_spec().unwrap();
        let mut user = complete_user();
        user.insert("verified", true);
        user.insert("createdAt", DateTime::now());
        assert!(spec.check(&user).is_ok());

        user.insert("lastLoginAt", "yesterday");
        user.insert("verificationToken", "1234567");
        let violations = spec.check(&user).unwrap_err();
        let fields: Vec<&str> = violations.iter().map(Violation::field).collect();
        assert_eq!(fields, ["lastLoginAt", "verificationToken"]);
    }

    #[test]
    fn test_short_first_name_is_rejected() {
        let spec = users_collection_spec().unwrap();
        let mut user = complete_user();
        user.insert("firstName", "J");
        assert!(matches!(
            spec.check(&user).unwrap_err().as_slice(),
            [Violation::TooShort { min: 2, .. }]
        ));
    }

    #[test]
    fn test_schema_carries_bounds() {
        let spec = users_collection_spec().unwrap();

        let mobile = spec.constraint("mobileNumber").unwrap();
        assert_eq!(mobile.bson_type(), BsonType::String);
        assert_eq!(mobile.max_length_bound(), Some(10));
        assert_eq!(mobile.min_length_bound(), None);

        let first_name = spec.constraint("firstName").unwrap();
        assert_eq!(first_name.min_length_bound(), Some(2));
        assert_eq!(first_name.max_length_bound(), Some(75));

        let profiles = spec.constraint("oauthProfiles").unwrap();
        assert_eq!(profiles.bson_type(), BsonType::Array);
        assert_eq!(profiles.max_items_bound(), Some(5));
        assert_eq!(profiles.max_length_bound(), None);

        assert_eq!(
            spec.constraint("createdAt").unwrap().bson_type(),
            BsonType::Date
        );
        assert!(spec.constraint("favouriteColour").is_none());

        let schema = spec.to_json_schema();
        let properties = schema.get_document("properties").unwrap();
        let mobile = properties.get_document("mobileNumber").unwrap();
        assert_eq!(mobile.get_i32("maxLength").unwrap(), 10);
        let profiles = properties.get_document("oauthProfiles").unwrap();
        assert_eq!(profiles.get_str("bsonType").unwrap(), "array");
        assert_eq!(profiles.get_i32("maxItems").unwrap(), 5);
    }

    #[test]
    fn test_descriptions_are_carried_into_the_validator() {
        let spec = users_collection_spec().unwrap();
        let expected = [
            ("username", "'username' is required and is a string"),
            ("firstName", "'firstName' is required and is a string"),
            ("lastName", "'lastName' is required and is a string"),
            ("email", "'email' is required and is a string"),
            ("password", "'password' is required and is a string"),
            ("mobileNumber", "'mobileNumber' is an optional field and is a string"),
            ("verified", "'verified' is an optional field and is a boolean"),
            ("verificationToken", "'verificationToken' is required and is a string"),
            ("activeStatus", "Status with a default value of 'active' or 'inactive'."),
            ("oauthProfiles", "'oauthProfiles' is an optional field and is an array"),
            ("acceptTerms", "'acceptTerms' is an optional field and is a boolean"),
            ("createdAt", "Creation date with a default value of the current date."),
            ("lastUpdatedAt", "Creation date with a default value of the last updated date."),
            ("lastLoginAt", "Creation date with a default value of the last login date."),
        ];

        let schema = spec.to_json_schema();
        let properties = schema.get_document("properties").unwrap();
        for (field, description) in expected {
            assert_eq!(
                spec.constraint(field).unwrap().description(),
                Some(description),
                "{field}"
            );
            assert_eq!(
                properties
                    .get_document(field)
                    .unwrap()
                    .get_str("description")
                    .unwrap(),
                description
            );
        }
    }
}
