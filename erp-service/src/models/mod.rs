pub mod activity;
pub mod customer;
pub mod invoice;
pub mod order;
pub mod product;
pub mod purchase;
pub mod stock;
pub mod supplier;
pub mod user;

pub use activity::{ActivityFilter, ActivityLog};
pub use customer::{CreateCustomer, Customer, CustomerFilter, CustomerWithStats, UpdateCustomer};
pub use invoice::{
    CreatePayment, GenerateInvoice, Invoice, InvoiceFilter, InvoiceItem, InvoiceStatus, Payment,
    PaymentStatus,
};
pub use order::{
    CreateOrderItem, CreateSalesOrder, SalesOrder, SalesOrderFilter, SalesOrderItem,
    SalesOrderStatus, StockEffect, UpdateSalesOrder,
};
pub use product::{
    Category, CreateCategory, CreateProduct, Product, ProductFilter, ProductStatus, UpdateCategory,
    UpdateProduct,
};
pub use purchase::{
    CreatePurchaseItem, CreatePurchaseOrder, PurchaseOrder, PurchaseOrderFilter, PurchaseOrderItem,
    PurchaseOrderStatus, UpdatePurchaseOrder,
};
pub use stock::{MovementRef, MovementType, StockAdjustment, StockMovement, StockMovementFilter};
pub use supplier::{CreateSupplier, Supplier, SupplierFilter, SupplierWithStats, UpdateSupplier};
pub use user::{CreateUser, SanitizedUser, UpdateUser, User, UserFilter, UserStatus};
