/// Organization primary key.
pub type OrgId = i64;

/// Primary key of an inventory row. Only unique within one category.
pub type ItemId = i64;
