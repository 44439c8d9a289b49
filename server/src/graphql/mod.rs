use async_graphql::{
    Context, EmptySubscription, ErrorExtensions, InputObject, Object, Schema, SimpleObject, ID,
};
use chrono::NaiveDate;
use platform_api::{ApiError, internal_error};
use products_hr::{Employee, EmployeeDraft, EmployeeId};
use tracing::instrument;

use crate::directory::{Directory, EmployeeEntry};

pub type SchemaType = Schema<QueryRoot, MutationRoot, EmptySubscription>;

pub fn build_schema(directory: Directory) -> SchemaType {
    Schema::build(QueryRoot, MutationRoot, EmptySubscription)
        .data(directory)
        .finish()
}

#[derive(Default)]
pub struct QueryRoot;

#[derive(Default)]
pub struct MutationRoot;

#[Object]
impl QueryRoot {
    #[instrument(name = "graphql.employees", skip_all)]
    async fn employees(&self, ctx: &Context<'_>) -> async_graphql::Result<Vec<EmployeeNode>> {
        let directory = directory(ctx)?;
        Ok(directory.list().into_iter().map(EmployeeNode::from).collect())
    }

    #[instrument(name = "graphql.version", skip_all)]
    async fn version(&self) -> String {
        env!("CARGO_PKG_VERSION").to_string()
    }
}

#[Object]
impl MutationRoot {
    /// Insert a new employee and return its identifier.
    #[instrument(name = "graphql.add_employee", skip_all)]
    async fn add_employee(
        &self,
        ctx: &Context<'_>,
        input: EmployeeInput,
    ) -> async_graphql::Result<ID> {
        let directory = directory(ctx)?;
        let candidate = Employee::try_from(EmployeeDraft::from(input))
            .map_err(|err| ApiError::from(err).extend())?;
        let id = directory.add(candidate).await.map_err(|err| err.extend())?;
        Ok(ID::from(id.to_string()))
    }

    /// Remove an employee and return the removed record.
    #[instrument(name = "graphql.delete_employee", skip_all)]
    async fn delete_employee(
        &self,
        ctx: &Context<'_>,
        id: ID,
    ) -> async_graphql::Result<EmployeeNode> {
        let directory = directory(ctx)?;
        let id = parse_id(&id)?;
        let employee = directory.remove(id).await.map_err(|err| err.extend())?;
        Ok(EmployeeNode::from(EmployeeEntry { id, employee }))
    }
}

#[derive(Clone, Debug, SimpleObject)]
#[graphql(name = "Employee")]
pub struct EmployeeNode {
    pub id: ID,
    pub first_name: String,
    pub last_name: String,
    pub birthday: NaiveDate,
    pub email: Option<String>,
}

impl From<EmployeeEntry> for EmployeeNode {
    fn from(entry: EmployeeEntry) -> Self {
        Self {
            id: ID::from(entry.id.to_string()),
            first_name: entry.employee.first_name,
            last_name: entry.employee.last_name,
            birthday: entry.employee.birthday,
            email: entry.employee.email,
        }
    }
}

#[derive(Clone, Debug, InputObject)]
pub struct EmployeeInput {
    pub first_name: String,
    pub last_name: String,
    /// ISO-8601 calendar date, e.g. `1815-12-10`.
    pub birthday: String,
    pub email: Option<String>,
}

impl From<EmployeeInput> for EmployeeDraft {
    fn from(input: EmployeeInput) -> Self {
        Self {
            first_name: input.first_name,
            last_name: input.last_name,
            birthday: input.birthday,
            email: input.email,
        }
    }
}

fn directory<'a>(ctx: &Context<'a>) -> async_graphql::Result<&'a Directory> {
    ctx.data::<Directory>()
        .map_err(|_| internal_error(anyhow::anyhow!("missing employee directory")))
}

fn parse_id(id: &ID) -> async_graphql::Result<EmployeeId> {
    id.as_str()
        .parse()
        .map_err(|_| ApiError::invalid_input("invalid employee id").extend())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_graphql::{Request, Value, Variables};
    use serde_json::json;

    const ADD: &str = r#"
        mutation Add($input: EmployeeInput!) {
            addEmployee(input: $input)
        }
    "#;

    fn ada_input() -> Variables {
        Variables::from_json(json!({
            "input": {
                "firstName": "Ada",
                "lastName": "Lovelace",
                "birthday": "1815-12-10",
                "email": "ada@example.com"
            }
        }))
    }

    fn error_code(response: &async_graphql::Response) -> Option<Value> {
        response.errors[0]
            .extensions
            .as_ref()
            .and_then(|ext| ext.get("code"))
            .cloned()
    }

    #[tokio::test]
    async fn add_then_list_employees() {
        let schema = build_schema(Directory::in_memory());
        let response = schema
            .execute(Request::new(ADD).variables(ada_input()))
            .await;
        assert!(response.errors.is_empty(), "{:?}", response.errors);
        let body = response.data.into_json().unwrap();
        let id = body["addEmployee"].as_str().unwrap().to_string();

        let response = schema
            .execute(Request::new(
                "{ employees { id firstName lastName birthday email } }",
            ))
            .await;
        assert!(response.errors.is_empty());
        let body = response.data.into_json().unwrap();
        assert_eq!(
            body,
            json!({"employees": [{
                "id": id,
                "firstName": "Ada",
                "lastName": "Lovelace",
                "birthday": "1815-12-10",
                "email": "ada@example.com"
            }]})
        );
    }

    #[tokio::test]
    async fn duplicate_surfaces_existing_id() {
        let schema = build_schema(Directory::in_memory());
        let first = schema
            .execute(Request::new(ADD).variables(ada_input()))
            .await;
        let first_id = first.data.into_json().unwrap()["addEmployee"].clone();

        let response = schema
            .execute(Request::new(ADD).variables(ada_input()))
            .await;
        assert_eq!(error_code(&response), Some(Value::from("DUPLICATE")));
        let existing = response.errors[0]
            .extensions
            .as_ref()
            .and_then(|ext| ext.get("existingId"))
            .cloned()
            .unwrap();
        assert_eq!(existing.into_json().unwrap(), first_id);
    }

    #[tokio::test]
    async fn invalid_birthday_is_a_validation_error() {
        let schema = build_schema(Directory::in_memory());
        let variables = Variables::from_json(json!({
            "input": {"firstName": "Ada", "lastName": "Lovelace", "birthday": "1815-02-30"}
        }));
        let response = schema.execute(Request::new(ADD).variables(variables)).await;
        assert_eq!(error_code(&response), Some(Value::from("VALIDATION")));
        let field = response.errors[0]
            .extensions
            .as_ref()
            .and_then(|ext| ext.get("field"))
            .cloned();
        assert_eq!(field, Some(Value::from("birthday")));
    }

    #[tokio::test]
    async fn delete_twice_reports_not_found() {
        let schema = build_schema(Directory::in_memory());
        let added = schema
            .execute(Request::new(ADD).variables(ada_input()))
            .await;
        let id = added.data.into_json().unwrap()["addEmployee"].clone();
        let delete = r#"mutation Del($id: ID!) { deleteEmployee(id: $id) { firstName } }"#;

        let response = schema
            .execute(Request::new(delete).variables(Variables::from_json(json!({"id": id}))))
            .await;
        assert!(response.errors.is_empty());
        assert_eq!(
            response.data.into_json().unwrap(),
            json!({"deleteEmployee": {"firstName": "Ada"}})
        );

        let response = schema
            .execute(Request::new(delete).variables(Variables::from_json(json!({"id": id}))))
            .await;
        assert_eq!(error_code(&response), Some(Value::from("NOT_FOUND")));
    }

    #[tokio::test]
    async fn malformed_id_is_bad_request() {
        let schema = build_schema(Directory::in_memory());
        let response = schema
            .execute(Request::new(r#"mutation { deleteEmployee(id: "id_1") { id } }"#))
            .await;
        assert_eq!(error_code(&response), Some(Value::from("BAD_REQUEST")));
    }
}
