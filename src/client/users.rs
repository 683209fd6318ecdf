use super::{ApiClient, ClientError};
use crate::{
    auth::MessageResponse,
    users::dto::{
        CreateUserRequest, PublicUser, UpdateUserRequest, UserEnvelope, UserListResponse,
        UserMessageResponse,
    },
};

impl ApiClient {
    pub async fn list_users(&self) -> Result<Vec<PublicUser>, ClientError> {
        let res: UserListResponse = self.get("/users").await?;
        Ok(res.users)
    }

    pub async fn get_user(&self, id: &str) -> Result<PublicUser, ClientError> {
        let env: UserEnvelope = self.get(&format!("/users/{id}")).await?;
        Ok(env.user)
    }

    pub async fn create_user(
        &self,
        req: &CreateUserRequest,
    ) -> Result<UserMessageResponse, ClientError> {
        self.post("/users", req).await
    }

    pub async fn update_user(
        &self,
        id: &str,
        req: &UpdateUserRequest,
    ) -> Result<UserMessageResponse, ClientError> {
        self.put(&format!("/users/{id}"), req).await
    }

    pub async fn delete_user(&self, id: &str) -> Result<MessageResponse, ClientError> {
        self.delete(&format!("/users/{id}")).await
    }
}
