use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    dto::{
        auth::{
            AdminLoginRequest, ForgotPasswordRequest, LoginResponse, OtpSent, PasswordReset,
            RegisterResponse, ResetLinkSent, ResetPasswordRequest, SendOtpRequest,
            StudentLoginRequest, StudentRegisterRequest,
        },
        contacts::{ContactList, CreateContactRequest},
        courses::CourseList,
        enrollments::{
            AdminEnrollmentList, AdminEnrollmentRow, EnrolledCourse, EnrolledCourseList,
            UpdateEnrollmentStatusRequest,
        },
        payments::{
            CreateOrderRequest, EnrollmentOutcome, OrderHandle, VerifyPaymentRequest,
            VerifyPaymentResponse,
        },
        students::{
            DeletedStudent, EnrollmentSummary, StudentList, StudentWithEnrollments,
            UpdateProfileRequest,
        },
    },
    middleware::auth::{AuthUser, Role},
    models::{Contact, Course, Enrollment, PaymentStatus, Student},
    response::{ApiResponse, Meta},
    routes::{admin, auth, contacts, courses, health, params, payments, students},
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        auth::send_otp,
        auth::register,
        auth::login,
        auth::admin_login,
        auth::forgot,
        auth::reset,
        auth::me,
        contacts::create_contact,
        courses::list_courses,
        courses::get_course,
        students::get_profile,
        students::update_profile,
        students::my_enrollments,
        payments::create_order,
        payments::verify_payment,
        payments::download_invoice,
        admin::list_students,
        admin::delete_student,
        admin::student_enrollments,
        admin::list_enrollments,
        admin::update_enrollment_status,
        admin::list_contacts,
        admin::delete_contact
    ),
    components(
        schemas(
            Student,
            Course,
            Enrollment,
            PaymentStatus,
            Role,
            AuthUser,
            StudentRegisterRequest,
            SendOtpRequest,
            OtpSent,
            ForgotPasswordRequest,
            ResetLinkSent,
            ResetPasswordRequest,
            PasswordReset,
            StudentLoginRequest,
            AdminLoginRequest,
            LoginResponse,
            RegisterResponse,
            CourseList,
            EnrolledCourse,
            EnrolledCourseList,
            UpdateEnrollmentStatusRequest,
            AdminEnrollmentRow,
            AdminEnrollmentList,
            CreateOrderRequest,
            OrderHandle,
            VerifyPaymentRequest,
            VerifyPaymentResponse,
            EnrollmentOutcome,
            UpdateProfileRequest,
            EnrollmentSummary,
            StudentWithEnrollments,
            StudentList,
            DeletedStudent,
            Contact,
            CreateContactRequest,
            ContactList,
            params::Pagination,
            params::CourseQuery,
            params::EnrollmentListQuery,
            Meta,
            ApiResponse<Course>,
            ApiResponse<CourseList>,
            ApiResponse<OrderHandle>,
            ApiResponse<VerifyPaymentResponse>,
            ApiResponse<StudentList>,
            ApiResponse<AdminEnrollmentList>,
            ApiResponse<ContactList>
        )
    ),
    security(
        ("bearer_auth" = [])
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Auth", description = "Authentication endpoints"),
        (name = "Courses", description = "Course catalog endpoints"),
        (name = "Student", description = "Student profile and enrollment endpoints"),
        (name = "Payments", description = "Payment order, verification and invoice endpoints"),
        (name = "Contacts", description = "Public contact form"),
        (name = "Admin", description = "Admin endpoints"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
