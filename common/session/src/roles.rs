pub const ROLE_SHOP: &str = "shop";
pub const ROLE_ADMIN: &str = "admin";
pub const ROLE_CUSTOMER: &str = "customer";

pub fn is_shop_role(role: &str) -> bool {
    role.trim().eq_ignore_ascii_case(ROLE_SHOP)
}
